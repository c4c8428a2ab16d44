//! Canvas, stroke, decoration and hierarchy rules applied to extracted shapes.
//!
//! Every per-shape rule is checked independently against every shape, so one
//! shape can fail several rules at once. Set-level rules (decoration budgets,
//! hierarchy, overlap) run once per shape set.

use tracing::debug;

use crate::models::{
    Category, DecorationKind, Issue, Role, Shape, ShapeKind, ValidationResult, ViewBox,
};
use crate::profile::{active_profile, RuleProfile};
use crate::validate::collector::IssueCollector;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn is_integer(value: f64) -> bool {
    value.fract().abs() < EPSILON
}

/// Validate shapes against the active profile's geometry rules.
pub fn validate_geometry(shapes: &[Shape], doc_viewbox: Option<&ViewBox>) -> ValidationResult {
    validate_geometry_with(shapes, doc_viewbox, &active_profile().rules)
}

pub fn validate_geometry_with(
    shapes: &[Shape],
    doc_viewbox: Option<&ViewBox>,
    rules: &RuleProfile,
) -> ValidationResult {
    let mut collector = IssueCollector::new();
    collect_geometry(shapes, doc_viewbox, rules, &mut collector);
    let result = collector.into_geometry_result();
    debug!(
        "Geometry validation: {} shapes, {} critical, {} warnings, score {}",
        shapes.len(),
        result.summary.critical,
        result.summary.warnings,
        result.score
    );
    result
}

/// Run every geometry rule family into an existing collector.
pub fn collect_geometry(
    shapes: &[Shape],
    doc_viewbox: Option<&ViewBox>,
    rules: &RuleProfile,
    collector: &mut IssueCollector,
) {
    check_viewbox(doc_viewbox, rules, collector);
    for shape in shapes {
        check_canvas(shape, rules, collector);
        check_stroke(shape, rules, collector);
        check_angle(shape, rules, collector);
        check_grid_snap(shape, collector);
        check_fill(shape, rules, collector);
        check_min_size(shape, rules, collector);
        check_path_length(shape, rules, collector);
    }
    check_decoration_budgets(shapes, rules, collector);
    check_hierarchy(shapes, rules, collector);
    check_overlap(shapes, collector);
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Only a declared viewBox is checked; an absent declaration passes.
fn check_viewbox(doc_viewbox: Option<&ViewBox>, rules: &RuleProfile, collector: &mut IssueCollector) {
    let canonical = rules.canonical_viewbox();
    let declared_ok = doc_viewbox.map_or(true, |vb| *vb == canonical);
    collector.check(declared_ok, || {
        let declared = doc_viewbox.map(ToString::to_string).unwrap_or_default();
        Issue::critical(
            "geometry.viewbox",
            Category::Geometry,
            format!("Invalid viewBox \"{declared}\" (expected \"{canonical}\")"),
        )
    });
}

fn check_canvas(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    let b = shape.bounds;
    collector.check(b.within(0.0, rules.canvas_size), || {
        Issue::critical(
            "geometry.canvas",
            Category::Geometry,
            format!(
                "{} extends outside the {size}x{size} canvas (x={}, y={}, w={}, h={})",
                shape.label(),
                b.x,
                b.y,
                b.width,
                b.height,
                size = rules.canvas_size
            ),
        )
        .on(shape)
    });

    let (lo, hi) = rules.live_area();
    collector.check(b.within(lo, hi), || {
        Issue::warning(
            "geometry.padding",
            Category::Geometry,
            format!(
                "{} leaves the live area [{lo}, {hi}] (x={}, y={}, w={}, h={})",
                shape.label(),
                b.x,
                b.y,
                b.width,
                b.height
            ),
        )
        .on(shape)
    });
}

// ---------------------------------------------------------------------------
// Stroke and fill
// ---------------------------------------------------------------------------

fn check_stroke(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    if let Some(stroke) = &shape.stroke {
        collector.check(approx_eq(stroke.width, rules.stroke_width), || {
            Issue::critical(
                "stroke.width",
                Category::Stroke,
                format!(
                    "Invalid stroke width: {} on {} (expected {})",
                    stroke.width,
                    shape.label(),
                    rules.stroke_width
                ),
            )
            .on(shape)
        });
        collector.check(rules.accepts_stroke_color(&stroke.color), || {
            Issue::warning(
                "stroke.color",
                Category::Stroke,
                format!(
                    "Invalid stroke color: {} on {} (expected one of {})",
                    stroke.color,
                    shape.label(),
                    rules.stroke_colors.join(", ")
                ),
            )
            .on(shape)
        });
    }

    if let (ShapeKind::Rectangle, Some(radius)) = (shape.kind, shape.corner_radius) {
        collector.check(rules.accepts_corner_radius(radius), || {
            Issue::warning(
                "stroke.corner_radius",
                Category::Stroke,
                format!(
                    "Invalid corner radius: {radius} on {} (allowed: {})",
                    shape.label(),
                    join_numbers(&rules.corner_radii)
                ),
            )
            .on(shape)
        });
    }
}

fn check_fill(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    collector.check(rules.accepts_fill(&shape.fill), || {
        Issue::warning(
            "stroke.fill",
            Category::Stroke,
            format!("Disallowed fill {} on {}", shape.fill, shape.label()),
        )
        .on(shape)
    });
}

// ---------------------------------------------------------------------------
// Perspective and grid
// ---------------------------------------------------------------------------

fn check_angle(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    let Some(angle) = shape.angle else {
        return;
    };
    collector.check(rules.accepts_angle(angle), || {
        Issue::warning(
            "perspective.angle",
            Category::Perspective,
            format!(
                "Line angle {angle}° on {} is not in the allowed set ({})",
                shape.label(),
                join_numbers(&rules.allowed_angles)
            ),
        )
        .on(shape)
    });
}

fn check_grid_snap(shape: &Shape, collector: &mut IssueCollector) {
    let off_grid: Vec<String> = shape
        .coordinates
        .iter()
        .filter(|(_, value)| !is_integer(**value))
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    collector.check(off_grid.is_empty(), || {
        Issue::critical(
            "geometry.grid_snap",
            Category::Geometry,
            format!(
                "Non-integer coordinates on {}: {}",
                shape.label(),
                off_grid.join(", ")
            ),
        )
        .on(shape)
    });
}

// ---------------------------------------------------------------------------
// Size and complexity
// ---------------------------------------------------------------------------

fn check_min_size(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    let extent = shape.legible_extent();
    collector.check(extent >= rules.min_element_size, || {
        Issue::critical(
            "accessibility.min_size",
            Category::Accessibility,
            format!(
                "{} is too small: {extent} units (minimum {})",
                shape.label(),
                rules.min_element_size
            ),
        )
        .on(shape)
    });
}

fn check_path_length(shape: &Shape, rules: &RuleProfile, collector: &mut IssueCollector) {
    let Some(d) = &shape.path_data else {
        return;
    };
    collector.check(d.len() <= rules.max_path_length, || {
        Issue::info(
            "composition.path_length",
            Category::Composition,
            format!(
                "Path data on {} is {} characters (advisory limit {})",
                shape.label(),
                d.len(),
                rules.max_path_length
            ),
        )
        .on(shape)
    });
}

// ---------------------------------------------------------------------------
// Set-level rules
// ---------------------------------------------------------------------------

fn check_decoration_budgets(shapes: &[Shape], rules: &RuleProfile, collector: &mut IssueCollector) {
    let count = |kind: DecorationKind| {
        shapes
            .iter()
            .filter(|s| s.is_decoration() && s.decoration_kind == Some(kind))
            .count()
    };
    let sparkles = count(DecorationKind::Sparkle);
    collector.check(sparkles <= rules.max_sparkles, || {
        Issue::warning(
            "decoration.sparkles",
            Category::Decoration,
            format!("Too many sparkles: {sparkles} (max {})", rules.max_sparkles),
        )
    });
    let dots = count(DecorationKind::Dot);
    collector.check(dots <= rules.max_dots, || {
        Issue::warning(
            "decoration.dots",
            Category::Decoration,
            format!("Too many dots: {dots} (max {})", rules.max_dots),
        )
    });
}

fn check_hierarchy(shapes: &[Shape], rules: &RuleProfile, collector: &mut IssueCollector) {
    let primaries = shapes.iter().filter(|s| s.role == Role::Primary).count();
    collector.check(primaries == 1, || {
        let message = if primaries == 0 {
            "No primary element found".to_string()
        } else {
            format!("Expected exactly one primary element, found {primaries}")
        };
        Issue::critical("composition.primary", Category::Composition, message)
    });

    let supporting = shapes.iter().filter(|s| s.role == Role::Supporting).count();
    collector.check(supporting <= rules.max_supporting, || {
        Issue::warning(
            "composition.supporting",
            Category::Composition,
            format!(
                "Too many supporting elements: {supporting} (max {})",
                rules.max_supporting
            ),
        )
    });
}

fn check_overlap(shapes: &[Shape], collector: &mut IssueCollector) {
    let pairs = overlapping_pairs(shapes);
    collector.check(pairs.is_empty(), || {
        let listed: Vec<String> = pairs
            .iter()
            .map(|(a, b)| format!("#{}/#{}", a + 1, b + 1))
            .collect();
        Issue::warning(
            "composition.overlap",
            Category::Composition,
            format!(
                "{} overlapping primary/supporting pair(s): {}",
                pairs.len(),
                listed.join(", ")
            ),
        )
    });
}

/// Unordered pairs of overlapping non-decoration shapes, each reported once
/// as `(lower index, higher index)`.
pub fn overlapping_pairs(shapes: &[Shape]) -> Vec<(usize, usize)> {
    let structural: Vec<&Shape> = shapes.iter().filter(|s| !s.is_decoration()).collect();
    let mut pairs = Vec::new();
    for (i, a) in structural.iter().enumerate() {
        for b in &structural[i + 1..] {
            if a.bounds.overlaps(&b.bounds) {
                pairs.push((a.index.min(b.index), a.index.max(b.index)));
            }
        }
    }
    pairs
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::document::parse_viewbox;
    use crate::extract::extract;
    use crate::models::Severity;

    fn run(doc: &str) -> ValidationResult {
        let shapes = extract(doc);
        validate_geometry_with(&shapes, parse_viewbox(doc).as_ref(), &RuleProfile::default())
    }

    const VALID_RECT: &str = r##"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" rx="2" stroke="#000000" stroke-width="2"/></svg>"##;

    #[test]
    fn test_valid_rectangle_scores_100() {
        let result = run(VALID_RECT);
        assert!(result.is_valid);
        assert_eq!(result.summary.critical, 0);
        assert_eq!(result.summary.warnings, 0);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_wrong_stroke_width_is_single_critical() {
        let result = run(&VALID_RECT.replace(r#"stroke-width="2""#, r#"stroke-width="3""#));
        assert!(!result.is_valid);
        assert_eq!(result.summary.critical, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].rule_id, "stroke.width");
        assert!(result.issues[0].message.starts_with("Invalid stroke width"));
        assert_eq!(result.score, 80.0);
    }

    #[test]
    fn test_five_sparkles_single_warning() {
        let mut doc = String::from(
            r#"<svg viewBox="0 0 24 24"><rect x="8" y="8" width="8" height="8"/>"#,
        );
        for x in [2, 6, 10, 14, 18] {
            doc.push_str(&format!(
                r#"<circle class="sparkle" cx="{}" cy="4" r="1"/>"#,
                x + 1
            ));
        }
        doc.push_str("</svg>");
        let result = run(&doc);
        assert!(result.is_valid);
        assert_eq!(result.summary.warnings, 1);
        assert_eq!(result.issues[0].rule_id, "decoration.sparkles");
        assert!(result.issues[0].message.starts_with("Too many sparkles"));
    }

    #[test]
    fn test_empty_shape_set_missing_primary() {
        let result = validate_geometry_with(&[], Some(&ViewBox::square(24.0)), &RuleProfile::default());
        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].rule_id, "composition.primary");
        assert_eq!(result.issues[0].message, "No primary element found");
    }

    #[test]
    fn test_viewbox_rules() {
        let missing = run(r#"<svg><rect x="4" y="4" width="16" height="16"/></svg>"#);
        assert!(missing.is_valid);
        assert!(!missing.has_rule("geometry.viewbox"));

        let wrong = run(r#"<svg viewBox="0 0 48 48"><rect x="4" y="4" width="16" height="16"/></svg>"#);
        assert!(!wrong.is_valid);
        assert_eq!(wrong.issues[0].rule_id, "geometry.viewbox");
        assert_eq!(wrong.issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_canonical_shapes_without_viewbox_score_full() {
        let shapes = extract(
            r##"<svg><rect x="4" y="4" width="16" height="16" rx="2" stroke="#000000" stroke-width="2"/></svg>"##,
        );
        let result = validate_geometry_with(&shapes, None, &RuleProfile::default());
        assert!(result.is_valid);
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_canvas_and_padding() {
        let result = run(r#"<svg viewBox="0 0 24 24"><rect x="1" y="4" width="16" height="16"/></svg>"#);
        assert!(result.is_valid);
        assert!(result.has_rule("geometry.padding"));
        assert!(!result.has_rule("geometry.canvas"));

        let outside = run(r#"<svg viewBox="0 0 24 24"><rect x="10" y="4" width="16" height="16"/></svg>"#);
        assert!(outside.has_rule("geometry.canvas"));
        assert!(outside.has_rule("geometry.padding"));
        assert_eq!(outside.score, 70.0);
    }

    #[test]
    fn test_grid_snap_and_fill() {
        let result = run(r#"<svg viewBox="0 0 24 24"><rect x="4.5" y="4" width="15" height="16" fill="red"/></svg>"#);
        let snap: Vec<&Issue> = result.issues_for("geometry.grid_snap").collect();
        assert_eq!(snap.len(), 1);
        assert!(snap[0].message.contains("x=4.5"));
        assert_eq!(snap[0].shape_index, Some(0));
        assert!(result.has_rule("stroke.fill"));
    }

    #[test]
    fn test_stroke_width_not_part_of_grid_snap() {
        let result = run(r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" stroke-width="1.5"/></svg>"#);
        assert!(result.has_rule("stroke.width"));
        assert!(!result.has_rule("geometry.grid_snap"));
    }

    #[test]
    fn test_angle_and_color_warnings() {
        let result = run(r#"<svg viewBox="0 0 24 24"><line x1="4" y1="4" x2="20" y2="8" stroke="red"/></svg>"#);
        assert!(result.is_valid);
        assert!(result.has_rule("perspective.angle"));
        assert!(result.has_rule("stroke.color"));
    }

    #[test]
    fn test_stroke_color_is_case_sensitive() {
        let upper = run(r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" stroke="BLACK"/></svg>"#);
        let issues: Vec<&Issue> = upper.issues_for("stroke.color").collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);

        let token = run(r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" stroke="black"/></svg>"#);
        assert!(!token.has_rule("stroke.color"));
    }

    #[test]
    fn test_corner_radius_warning() {
        let result = run(r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" rx="3"/></svg>"#);
        assert_eq!(result.summary.warnings, 1);
        assert!(result.has_rule("stroke.corner_radius"));
    }

    #[test]
    fn test_min_size_critical() {
        let result = run(r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="1"/></svg>"#);
        assert!(result.has_rule("accessibility.min_size"));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_long_path_is_info_only() {
        let d = format!("M4 4 {}", "L8 8 L4 4 ".repeat(25));
        let doc = format!(r#"<svg viewBox="0 0 24 24"><path d="{d}"/></svg>"#);
        let result = run(&doc);
        assert!(result.is_valid);
        assert_eq!(result.summary.info, 1);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_hierarchy_rules() {
        let doc = r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="4" height="4"/><rect x="12" y="12" width="4" height="4"/><rect class="supporting" x="4" y="12" width="2" height="2"/><rect class="supporting" x="8" y="16" width="2" height="2"/><rect class="supporting" x="16" y="4" width="2" height="2"/></svg>"#;
        let result = run(doc);
        assert!(!result.is_valid);
        let primary: Vec<&Issue> = result.issues_for("composition.primary").collect();
        assert_eq!(primary[0].message, "Expected exactly one primary element, found 2");
        assert!(result.has_rule("composition.supporting"));
    }

    #[test]
    fn test_overlap_pairs_reported_once() {
        let doc = r#"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="10" height="10"/><rect class="supporting" x="8" y="8" width="10" height="10"/><circle class="sparkle" cx="10" cy="10" r="2"/></svg>"#;
        let shapes = extract(doc);
        assert_eq!(overlapping_pairs(&shapes), vec![(0, 1)]);
        let mut reversed = shapes.clone();
        reversed.reverse();
        assert_eq!(overlapping_pairs(&reversed), vec![(0, 1)]);
        let result = run(doc);
        assert_eq!(result.issues_for("composition.overlap").count(), 1);
    }
}
