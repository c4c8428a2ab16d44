//! Fit of a candidate icon against an already-accepted sibling set.
//!
//! The set is summarised into [`IconSetStats`]; the candidate is summarised the
//! same way and compared scalar by scalar with fixed tolerances. Metaphor
//! conflicts are reported alongside but never scored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::extract;
use crate::models::{
    ConsistencyResult, ConsistencyViolation, IconSetStats, IconSummary, MetaphorConflict,
    MetaphorMatch, ScalarStats, Shape, ShapeKind, SiblingToken, VisualStyle,
};

const VIOLATION_PENALTY: f64 = 15.0;
const MAX_DOMINANT_METAPHORS: usize = 5;

/// Tokens that describe rendering variants rather than what an icon depicts.
const STYLE_WORDS: &[&str] = &[
    "icon", "outline", "outlined", "filled", "fill", "solid", "line", "small", "large", "sm",
    "md", "lg", "alt",
];

/// Groups of tokens that name the same metaphor.
const SYNONYMS: &[&[&str]] = &[
    &["trash", "delete", "bin", "remove"],
    &["gear", "settings", "cog", "preferences"],
    &["home", "house"],
    &["search", "magnifier", "find"],
    &["edit", "pencil", "write"],
    &["user", "person", "profile", "account"],
    &["bell", "notification", "alert"],
    &["mail", "email", "envelope", "message"],
    &["document", "file", "page"],
    &["chart", "graph", "analytics"],
    &["lock", "secure", "security", "padlock"],
    &["add", "plus", "create", "new"],
    &["close", "cancel", "dismiss"],
    &["download", "save"],
];

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

pub fn classify_style(shapes: &[Shape]) -> VisualStyle {
    let rounded = shapes.iter().any(|s| {
        s.corner_radius.is_some_and(|r| r > 0.0)
            || s
                .stroke
                .as_ref()
                .and_then(|st| st.linecap.as_deref())
                .is_some_and(|cap| cap.eq_ignore_ascii_case("round"))
    });
    if rounded {
        return VisualStyle::Rounded;
    }
    let filled = shapes.iter().any(|s| {
        let fill = s.fill.trim();
        !fill.is_empty() && !fill.eq_ignore_ascii_case("none") && !fill.eq_ignore_ascii_case("transparent")
    });
    if filled {
        VisualStyle::Filled
    } else if shapes.iter().any(|s| s.kind == ShapeKind::Circle) {
        VisualStyle::Geometric
    } else {
        VisualStyle::Outlined
    }
}

/// The token an icon name contributes to metaphor comparison.
pub fn metaphor_token(name: &str) -> Option<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .map(str::to_ascii_lowercase)
        .find(|t| !t.is_empty() && !STYLE_WORDS.contains(&t.as_str()) && !t.chars().all(|c| c.is_ascii_digit()))
}

fn synonym_group(token: &str) -> Option<usize> {
    SYNONYMS.iter().position(|group| group.contains(&token))
}

pub fn metaphor_match(a: &str, b: &str) -> Option<MetaphorMatch> {
    if a == b {
        return Some(MetaphorMatch::Exact);
    }
    match (synonym_group(a), synonym_group(b)) {
        (Some(x), Some(y)) if x == y => Some(MetaphorMatch::Synonym),
        _ => None,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

impl IconSummary {
    pub fn from_shapes(name: &str, shapes: &[Shape]) -> Self {
        Self {
            name: name.to_string(),
            stroke_weight: mean(shapes.iter().filter_map(|s| s.stroke.as_ref()).map(|st| st.width)),
            corner_radius: mean(shapes.iter().filter_map(|s| s.corner_radius)),
            element_count: shapes.len(),
            style: classify_style(shapes),
            metaphor: metaphor_token(name),
        }
    }

    pub fn from_document(name: &str, document: &str) -> Self {
        Self::from_shapes(name, &extract(document))
    }
}

impl IconSetStats {
    pub fn from_summaries(summaries: &[IconSummary]) -> Self {
        if summaries.is_empty() {
            return Self::default();
        }
        let scalar = |f: fn(&IconSummary) -> f64| {
            ScalarStats::from_values(&summaries.iter().map(f).collect::<Vec<f64>>())
        };

        let mut style_counts: IndexMap<VisualStyle, usize> = IndexMap::new();
        let mut metaphor_counts: IndexMap<String, usize> = IndexMap::new();
        let mut sibling_tokens = Vec::new();
        for summary in summaries {
            *style_counts.entry(summary.style).or_default() += 1;
            if let Some(token) = &summary.metaphor {
                *metaphor_counts.entry(token.clone()).or_default() += 1;
                sibling_tokens.push(SiblingToken {
                    name: summary.name.clone(),
                    token: token.clone(),
                });
            }
        }

        let top = style_counts.values().copied().max().unwrap_or(0);
        let dominant_styles = style_counts
            .iter()
            .filter(|(_, count)| **count == top)
            .map(|(style, _)| *style)
            .collect();

        let mut metaphors: Vec<(String, usize)> = metaphor_counts.into_iter().collect();
        // stable: ties keep first-seen order
        metaphors.sort_by(|a, b| b.1.cmp(&a.1));
        let dominant_metaphors = metaphors
            .into_iter()
            .take(MAX_DOMINANT_METAPHORS)
            .map(|(token, _)| token)
            .collect();

        Self {
            icon_count: summaries.len(),
            stroke_weight: scalar(|s: &IconSummary| s.stroke_weight),
            corner_radius: scalar(|s: &IconSummary| s.corner_radius),
            element_count: scalar(|s: &IconSummary| s.element_count as f64),
            dominant_styles,
            dominant_metaphors,
            sibling_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Allowed distance from the set average per scalar property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyTolerances {
    pub stroke_weight: f64,
    pub corner_radius: f64,
    pub complexity: f64,
}

impl Default for ConsistencyTolerances {
    fn default() -> Self {
        Self {
            stroke_weight: 0.5,
            corner_radius: 1.0,
            complexity: 3.0,
        }
    }
}

fn scalar_violation(
    property: &str,
    expected: f64,
    actual: f64,
    tolerance: f64,
) -> Option<ConsistencyViolation> {
    if (actual - expected).abs() <= tolerance {
        return None;
    }
    Some(ConsistencyViolation {
        property: property.to_string(),
        expected: format!("{expected:.1}"),
        actual: format!("{actual:.1}"),
        message: format!(
            "Candidate {property} {actual:.1} differs from the set average {expected:.1} by more than {tolerance}"
        ),
    })
}

pub fn validate_against_set(
    candidate: &IconSummary,
    stats: &IconSetStats,
    tolerances: &ConsistencyTolerances,
) -> ConsistencyResult {
    if stats.icon_count == 0 {
        return ConsistencyResult {
            is_consistent: true,
            consistency_score: 100.0,
            violations: Vec::new(),
            recommendations: vec![format!(
                "No sibling icons yet; '{}' establishes the baseline for this set",
                candidate.name
            )],
            metaphor_conflicts: Vec::new(),
        };
    }

    let mut violations: Vec<ConsistencyViolation> = [
        scalar_violation(
            "stroke weight",
            stats.stroke_weight.avg,
            candidate.stroke_weight,
            tolerances.stroke_weight,
        ),
        scalar_violation(
            "corner radius",
            stats.corner_radius.avg,
            candidate.corner_radius,
            tolerances.corner_radius,
        ),
        scalar_violation(
            "complexity",
            stats.element_count.avg,
            candidate.element_count as f64,
            tolerances.complexity,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if !stats.dominant_styles.is_empty() && !stats.dominant_styles.contains(&candidate.style) {
        let expected: Vec<&str> = stats.dominant_styles.iter().map(VisualStyle::as_str).collect();
        violations.push(ConsistencyViolation {
            property: "style".to_string(),
            expected: expected.join(" | "),
            actual: candidate.style.as_str().to_string(),
            message: format!(
                "Candidate style {} does not match the set's dominant style {}",
                candidate.style.as_str(),
                expected.join(" | ")
            ),
        });
    }

    let metaphor_conflicts: Vec<MetaphorConflict> = match &candidate.metaphor {
        Some(token) => stats
            .sibling_tokens
            .iter()
            .filter(|sibling| sibling.name != candidate.name)
            .filter_map(|sibling| {
                metaphor_match(token, &sibling.token).map(|match_kind| MetaphorConflict {
                    sibling: sibling.name.clone(),
                    candidate_token: token.clone(),
                    sibling_token: sibling.token.clone(),
                    match_kind,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    let mut recommendations: Vec<String> = violations
        .iter()
        .map(|v| format!("Adjust {} to {} to match the set", v.property, v.expected))
        .collect();
    recommendations.extend(metaphor_conflicts.iter().map(|c| {
        format!(
            "Metaphor '{}' is already used by '{}'; choose a distinct metaphor",
            c.candidate_token, c.sibling
        )
    }));

    let consistency_score = (100.0 - VIOLATION_PENALTY * violations.len() as f64).max(0.0);
    debug!(
        "Consistency of '{}' against {} icons: {} violations, {} metaphor conflicts",
        candidate.name,
        stats.icon_count,
        violations.len(),
        metaphor_conflicts.len()
    );
    ConsistencyResult {
        is_consistent: violations.is_empty(),
        consistency_score,
        violations,
        recommendations,
        metaphor_conflicts,
    }
}

/// Summarise a candidate document and validate it against the set.
pub fn validate_document_against_set(
    name: &str,
    document: &str,
    stats: &IconSetStats,
    tolerances: &ConsistencyTolerances,
) -> ConsistencyResult {
    validate_against_set(&IconSummary::from_document(name, document), stats, tolerances)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, stroke_weight: f64) -> IconSummary {
        IconSummary {
            name: name.to_string(),
            stroke_weight,
            corner_radius: 2.0,
            element_count: 2,
            style: VisualStyle::Rounded,
            metaphor: metaphor_token(name),
        }
    }

    fn set() -> IconSetStats {
        IconSetStats::from_summaries(&[
            summary("home-outline", 2.0),
            summary("settings", 2.0),
            summary("bell-alert", 2.0),
        ])
    }

    #[test]
    fn test_double_stroke_weight_is_single_violation() {
        let result = validate_against_set(
            &summary("chart-bar", 4.0),
            &set(),
            &ConsistencyTolerances::default(),
        );
        assert!(!result.is_consistent);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].property, "stroke weight");
        assert_eq!(result.consistency_score, 85.0);
        assert!(result.metaphor_conflicts.is_empty());
    }

    #[test]
    fn test_within_tolerance_is_consistent() {
        let result = validate_against_set(
            &summary("chart-bar", 2.5),
            &set(),
            &ConsistencyTolerances::default(),
        );
        assert!(result.is_consistent);
        assert_eq!(result.consistency_score, 100.0);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_style_mismatch_and_score_floor() {
        let mut candidate = summary("chart", 9.0);
        candidate.style = VisualStyle::Filled;
        candidate.corner_radius = 9.0;
        candidate.element_count = 40;
        let result = validate_against_set(&candidate, &set(), &ConsistencyTolerances::default());
        let properties: Vec<&str> = result.violations.iter().map(|v| v.property.as_str()).collect();
        assert_eq!(properties, vec!["stroke weight", "corner radius", "complexity", "style"]);
        assert_eq!(result.consistency_score, 40.0);
        assert_eq!(result.recommendations.len(), 4);
    }

    #[test]
    fn test_metaphor_conflicts_not_scored() {
        let result = validate_against_set(
            &summary("house-filled", 2.0),
            &set(),
            &ConsistencyTolerances::default(),
        );
        assert!(result.is_consistent);
        assert_eq!(result.consistency_score, 100.0);
        assert_eq!(result.metaphor_conflicts.len(), 1);
        assert_eq!(result.metaphor_conflicts[0].sibling, "home-outline");
        assert_eq!(result.metaphor_conflicts[0].match_kind, MetaphorMatch::Synonym);

        let exact = validate_against_set(&summary("bell", 2.0), &set(), &ConsistencyTolerances::default());
        assert_eq!(exact.metaphor_conflicts[0].match_kind, MetaphorMatch::Exact);
    }

    #[test]
    fn test_empty_set_sets_baseline() {
        let result = validate_against_set(
            &summary("chart", 4.0),
            &IconSetStats::from_summaries(&[]),
            &ConsistencyTolerances::default(),
        );
        assert!(result.is_consistent);
        assert_eq!(result.consistency_score, 100.0);
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_set_stats_aggregation() {
        let mut filled = summary("folder", 3.0);
        filled.style = VisualStyle::Filled;
        let stats = IconSetStats::from_summaries(&[
            summary("home", 1.0),
            filled,
            summary("home-alt", 2.0),
        ]);
        assert_eq!(stats.icon_count, 3);
        assert_eq!(stats.stroke_weight.min, 1.0);
        assert_eq!(stats.stroke_weight.max, 3.0);
        assert!((stats.stroke_weight.avg - 2.0).abs() < 1e-9);
        assert_eq!(stats.dominant_styles, vec![VisualStyle::Rounded]);
        assert_eq!(stats.dominant_metaphors, vec!["home".to_string(), "folder".to_string()]);
        assert_eq!(stats.sibling_tokens.len(), 3);
    }

    #[test]
    fn test_style_classifier() {
        let rounded = extract(r#"<svg><rect x="4" y="4" width="16" height="16" rx="2"/></svg>"#);
        assert_eq!(classify_style(&rounded), VisualStyle::Rounded);
        let capped = extract(r#"<svg><line x1="4" y1="4" x2="20" y2="4" stroke-linecap="round"/></svg>"#);
        assert_eq!(classify_style(&capped), VisualStyle::Rounded);
        let filled = extract(r#"<svg><rect x="4" y="4" width="16" height="16" fill="black"/></svg>"#);
        assert_eq!(classify_style(&filled), VisualStyle::Filled);
        let circle = extract(r#"<svg><circle cx="12" cy="12" r="8"/></svg>"#);
        assert_eq!(classify_style(&circle), VisualStyle::Geometric);
        let plain = extract(r#"<svg><rect x="4" y="4" width="16" height="16"/></svg>"#);
        assert_eq!(classify_style(&plain), VisualStyle::Outlined);
    }

    #[test]
    fn test_summary_from_document() {
        let summary = IconSummary::from_document(
            "trash-outline",
            r#"<svg><rect x="4" y="4" width="16" height="16" rx="2" stroke-width="2"/><line x1="8" y1="8" x2="8" y2="16" stroke-width="3"/></svg>"#,
        );
        assert_eq!(summary.element_count, 2);
        assert!((summary.stroke_weight - 2.5).abs() < 1e-9);
        assert_eq!(summary.corner_radius, 2.0);
        assert_eq!(summary.style, VisualStyle::Rounded);
        assert_eq!(summary.metaphor.as_deref(), Some("trash"));
    }

    #[test]
    fn test_metaphor_token() {
        assert_eq!(metaphor_token("icon-24-lock_outline").as_deref(), Some("lock"));
        assert_eq!(metaphor_token("outline-24"), None);
        assert_eq!(metaphor_match("trash", "delete"), Some(MetaphorMatch::Synonym));
        assert_eq!(metaphor_match("trash", "home"), None);
    }
}
