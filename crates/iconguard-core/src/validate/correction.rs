//! Correction synthesis: failed validations become prioritized regeneration
//! directives, and a subset of issues become deterministic document fixes.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::document::parse_number;
use crate::models::{
    AutoFix, Category, CorrectionDirective, DirectiveEntry, Issue, Priority, ValidationResult,
};
use crate::profile::RuleProfile;

// ---------------------------------------------------------------------------
// Instruction templates
// ---------------------------------------------------------------------------

struct Template {
    instruction: &'static str,
    example: &'static str,
}

const fn template(instruction: &'static str, example: &'static str) -> Template {
    Template {
        instruction,
        example,
    }
}

fn template_for(rule_id: &str) -> Option<Template> {
    let t = match rule_id {
        "geometry.viewbox" => template(
            "Declare the canonical square canvas on the root element.",
            r#"<svg viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg">"#,
        ),
        "geometry.canvas" => template(
            "Keep every element inside the canvas bounds.",
            r#"<rect x="4" y="4" width="16" height="16"/> instead of <rect x="20" y="4" width="8" height="16"/>"#,
        ),
        "geometry.padding" => template(
            "Keep every element inside the live area, leaving the padding band empty.",
            r#"<circle cx="12" cy="12" r="9"/> instead of <circle cx="12" cy="12" r="12"/>"#,
        ),
        "geometry.grid_snap" => template(
            "Place all coordinates and dimensions on whole-unit grid positions.",
            r#"<rect x="4" y="4" width="16" height="16"/> instead of <rect x="4.5" y="3.7" width="15.2" height="16"/>"#,
        ),
        "stroke.width" => template(
            "Use the canonical stroke width on every stroked element.",
            r#"stroke-width="2""#,
        ),
        "stroke.color" => template(
            "Use an approved stroke color.",
            r##"stroke="#000000""##,
        ),
        "stroke.corner_radius" => template(
            "Use an approved corner radius on rectangles.",
            r#"<rect x="4" y="4" width="16" height="16" rx="2"/>"#,
        ),
        "stroke.fill" => template(
            "Use no fill or an approved fill color.",
            r#"fill="none""#,
        ),
        "stroke.linecap" => template(
            "Use the linecap required by the design system on every stroked element.",
            r#"stroke-linecap="round""#,
        ),
        "perspective.angle" => template(
            "Draw diagonal strokes only at approved angles.",
            r#"<line x1="6" y1="18" x2="18" y2="6"/> (45 degrees)"#,
        ),
        "perspective.transform" => template(
            "Draw the icon flat, front-facing, without skew, matrix or 3D transforms.",
            r#"<path d="M4 20 L12 4 L20 20 Z"/> with no transform attribute"#,
        ),
        "accessibility.min_size" => template(
            "Enlarge or remove details too small to survive small render sizes.",
            r#"<circle cx="12" cy="12" r="2"/> instead of <circle cx="12" cy="12" r="0.5"/>"#,
        ),
        "composition.primary" => template(
            "Build the icon around exactly one primary element that carries the metaphor.",
            r#"<rect class="primary" x="4" y="4" width="16" height="16"/>"#,
        ),
        "composition.supporting" => template(
            "Reduce the number of supporting elements.",
            r#"one primary shape plus at most two supporting shapes"#,
        ),
        "composition.overlap" => template(
            "Separate overlapping elements or merge them into a single path.",
            r#"<path d="M4 4 H20 V20 H4 Z M8 8 H16"/> instead of two stacked rectangles"#,
        ),
        "composition.path_length" => template(
            "Simplify long path data with fewer, larger segments.",
            r#"<path d="M4 12 H20"/> instead of many short segments along the same line"#,
        ),
        "decoration.sparkles" => template(
            "Remove surplus sparkle decorations.",
            r#"at most three <path class="sparkle" .../> elements"#,
        ),
        "decoration.dots" => template(
            "Remove surplus dot decorations.",
            r#"at most five <circle class="dot" .../> elements"#,
        ),
        "semantics.naming" => template(
            "Rename the icon using lowercase tokens joined by the separator.",
            "arrow-left-circle",
        ),
        "semantics.design_system" => template(
            "Target the design system the icon is validated against.",
            r#"{"designSystem": "enterprise"}"#,
        ),
        "effects.gradient" => template(
            "Remove gradient definitions and use a solid approved color.",
            r##"fill="none" stroke="#000000""##,
        ),
        "effects.filter" | "effects.drop_shadow" => template(
            "Remove filters and shadows; icons are flat.",
            r#"<path d="..."/> with no filter attribute"#,
        ),
        "effects.mask" | "effects.clip_path" => template(
            "Remove masks and clip paths; draw the visible shape directly.",
            r#"<path d="M4 4 H20 V12 H4 Z"/> instead of a clipped rectangle"#,
        ),
        id if id.starts_with("semantics.metadata.") => template(
            "Provide the metadata field with one of the allowed values.",
            r#"{"domain": "finance", "function": "object", "userRole": "analyst", "iconType": "ui", "systemArea": "reports"}"#,
        ),
        _ => return None,
    };
    Some(t)
}

fn fallback_template(category: Category) -> Template {
    match category {
        Category::Geometry => template(
            "Correct the element geometry to fit the canonical canvas.",
            r#"<svg viewBox="0 0 24 24">"#,
        ),
        Category::Stroke => template(
            "Correct the stroke attributes to the design-system values.",
            r##"stroke="#000000" stroke-width="2""##,
        ),
        Category::Perspective => template(
            "Draw the icon flat and front-facing.",
            "no skewed or rotated-in-depth shapes",
        ),
        Category::Composition => template(
            "Simplify the composition around a single primary element.",
            "one primary shape plus at most two supporting shapes",
        ),
        Category::Accessibility => template(
            "Make every detail legible at small render sizes.",
            "details at least 2 units wide",
        ),
        Category::Semantics => template(
            "Correct the icon metadata.",
            r#"{"name": "arrow-left"}"#,
        ),
        Category::Decoration => template(
            "Reduce decorative elements.",
            "fewer sparkles and dots",
        ),
    }
}

fn entry_for(issue: &Issue) -> DirectiveEntry {
    let t = template_for(&issue.rule_id).unwrap_or_else(|| fallback_template(issue.category));
    DirectiveEntry {
        rule_id: issue.rule_id.clone(),
        category: issue.category,
        severity: issue.severity,
        instruction: format!("{} Found: {}", t.instruction, issue.message),
        worked_example: t.example.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

pub fn priority_for(result: &ValidationResult) -> Priority {
    if result.summary.critical > 0 {
        Priority::High
    } else if result.summary.warnings > 2 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Build the directive for a failed validation; `None` when it passed.
///
/// Entries are ordered Critical, Warning, Info and keep issue order within a
/// severity.
pub fn synthesize(result: &ValidationResult, attempt: u32) -> Option<CorrectionDirective> {
    if result.is_valid {
        return None;
    }
    let mut issues: Vec<&Issue> = result.issues.iter().collect();
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));
    let directive = CorrectionDirective {
        entries: issues.into_iter().map(entry_for).collect(),
        priority: priority_for(result),
        attempt,
        auto_fixes: auto_fixes_for(result),
    };
    debug!(
        "Synthesized correction attempt {} with {} entries, priority {:?}",
        attempt,
        directive.entries.len(),
        directive.priority
    );
    Some(directive)
}

impl CorrectionDirective {
    /// Render as plain-text context for a regeneration request.
    pub fn to_prompt(&self) -> String {
        let mut out = format!(
            "Correction attempt {} (priority: {}). Fix the following issues:\n",
            self.attempt,
            self.priority.as_str()
        );
        for (i, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{}] {} ({}): {}\n   Example: {}\n",
                i + 1,
                entry.severity.as_str(),
                entry.rule_id,
                entry.category.as_str(),
                entry.instruction,
                entry.worked_example
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Deterministic fixes
// ---------------------------------------------------------------------------

static STROKE_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"stroke-width\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

static VIEWBOX_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

static SVG_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\s*svg\b").unwrap());

static EFFECT_BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["linearGradient", "radialGradient", "filter"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(
                r"(?is)<\s*{tag}\b[^>]*?/\s*>|<\s*{tag}\b.*?<\s*/\s*{tag}\s*>"
            ))
            .unwrap()
        })
        .collect()
});

static FILTER_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+filter\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

static PAINT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|\s)(fill|stroke)\s*=\s*["']\s*url\([^)]*\)\s*["']"#).unwrap()
});

static COORDINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|\s)(x|y|width|height|cx|cy|r|x1|y1|x2|y2|rx|ry)\s*=\s*("[^"]*"|'[^']*')"#)
        .unwrap()
});

/// Deterministic transforms applicable to the issues in `result`, deduplicated.
pub fn auto_fixes_for(result: &ValidationResult) -> Vec<AutoFix> {
    let mut fixes = Vec::new();
    for issue in &result.issues {
        let fix = match issue.rule_id.as_str() {
            "stroke.width" => AutoFix::StrokeWidth,
            "geometry.viewbox" => AutoFix::ViewBox,
            "effects.gradient" | "effects.filter" => AutoFix::StripEffects,
            "geometry.grid_snap" => AutoFix::RoundCoordinates,
            _ => continue,
        };
        if !fixes.contains(&fix) {
            fixes.push(fix);
        }
    }
    fixes
}

/// Result of applying a batch of auto-fixes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoFixOutcome {
    pub document: String,
    /// Fixes that changed the document, in application order.
    pub applied: Vec<AutoFix>,
}

pub fn apply_auto_fix(document: &str, fix: AutoFix, rules: &RuleProfile) -> String {
    match fix {
        AutoFix::StrokeWidth => {
            let replacement = format!(r#"stroke-width="{}""#, rules.stroke_width);
            STROKE_WIDTH_RE
                .replace_all(document, replacement.as_str())
                .into_owned()
        }
        AutoFix::ViewBox => {
            let canonical = rules.canonical_viewbox();
            if VIEWBOX_ATTR_RE.is_match(document) {
                let replacement = format!(r#"viewBox="{canonical}""#);
                VIEWBOX_ATTR_RE
                    .replacen(document, 1, replacement.as_str())
                    .into_owned()
            } else {
                let replacement = format!(r#"<svg viewBox="{canonical}""#);
                SVG_OPEN_RE
                    .replacen(document, 1, replacement.as_str())
                    .into_owned()
            }
        }
        AutoFix::StripEffects => {
            let mut out = document.to_string();
            for re in EFFECT_BLOCK_RES.iter() {
                out = re.replace_all(&out, "").into_owned();
            }
            out = FILTER_ATTR_RE.replace_all(&out, "").into_owned();
            let stroke_color = rules
                .stroke_colors
                .first()
                .map(String::as_str)
                .unwrap_or("#000000");
            PAINT_URL_RE
                .replace_all(&out, |caps: &Captures| {
                    let paint = if &caps[2] == "fill" { "none" } else { stroke_color };
                    format!(r#"{}{}="{}""#, &caps[1], &caps[2], paint)
                })
                .into_owned()
        }
        AutoFix::RoundCoordinates => COORDINATE_RE
            .replace_all(document, |caps: &Captures| {
                let quoted = &caps[3];
                let raw = &quoted[1..quoted.len() - 1];
                match parse_number(raw) {
                    Some(value) => {
                        let rounded = value.round();
                        // avoid emitting "-0"
                        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
                        format!(r#"{}{}="{}""#, &caps[1], &caps[2], rounded)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned(),
    }
}

pub fn apply_auto_fixes(document: &str, fixes: &[AutoFix], rules: &RuleProfile) -> AutoFixOutcome {
    let mut current = document.to_string();
    let mut applied = Vec::new();
    for fix in fixes {
        let next = apply_auto_fix(&current, *fix, rules);
        if next != current {
            applied.push(*fix);
            current = next;
        }
    }
    debug!("Applied {} of {} auto-fixes", applied.len(), fixes.len());
    AutoFixOutcome {
        document: current,
        applied,
    }
}
