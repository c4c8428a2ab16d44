//! Design-system compliance: geometry rules plus metadata, naming and
//! forbidden-effect checks from a [`ComplianceProfile`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extract::document::parse_viewbox;
use crate::extract::extract;
use crate::models::{Category, IconMetadata, Issue, Shape, ValidationResult};
use crate::profile::{active_profile, ComplianceProfile, Effect};
use crate::validate::collector::IssueCollector;
use crate::validate::geometry::collect_geometry;

// ---------------------------------------------------------------------------
// Effect detection
// ---------------------------------------------------------------------------

static EFFECT_PATTERNS: LazyLock<Vec<(Effect, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Effect::Gradient,
            Regex::new(r"(?i)<\s*(?:linear|radial)gradient\b").unwrap(),
        ),
        (
            Effect::Filter,
            Regex::new(r#"(?i)<\s*filter\b|[\s"';]filter\s*[=:]"#).unwrap(),
        ),
        (
            Effect::Mask,
            Regex::new(r#"(?i)<\s*mask\b|[\s"';]mask\s*[=:]"#).unwrap(),
        ),
        (
            Effect::ClipPath,
            Regex::new(r"(?i)<\s*clippath\b|clip-path\s*[=:]").unwrap(),
        ),
        (
            Effect::DropShadow,
            Regex::new(r"(?i)drop-shadow|<\s*fedropshadow\b").unwrap(),
        ),
        (
            Effect::SkewTransform,
            Regex::new(
                r#"(?i)transform\s*=\s*["'][^"']*\b(?:skew[xy]?|matrix(?:3d)?|perspective|rotate3d|rotate[xy])\s*\("#,
            )
            .unwrap(),
        ),
    ]
});

/// Every effect kind present in the raw document, in [`Effect::ALL`] order.
pub fn effects_in(document: &str) -> Vec<Effect> {
    EFFECT_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(document))
        .map(|(effect, _)| *effect)
        .collect()
}

pub fn effect_rule_id(effect: Effect) -> &'static str {
    match effect {
        Effect::Gradient => "effects.gradient",
        Effect::Filter => "effects.filter",
        Effect::Mask => "effects.mask",
        Effect::ClipPath => "effects.clip_path",
        Effect::DropShadow => "effects.drop_shadow",
        Effect::SkewTransform => "perspective.transform",
    }
}

fn effect_category(effect: Effect) -> Category {
    match effect {
        Effect::SkewTransform => Category::Perspective,
        _ => Category::Decoration,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a document and its metadata against the active profile.
pub fn validate_compliance(document: &str, metadata: &IconMetadata) -> ValidationResult {
    validate_compliance_with(document, metadata, active_profile())
}

pub fn validate_compliance_with(
    document: &str,
    metadata: &IconMetadata,
    profile: &ComplianceProfile,
) -> ValidationResult {
    let shapes = extract(document);
    validate_compliance_shapes(document, &shapes, metadata, profile)
}

/// Same as [`validate_compliance_with`] for callers that already extracted shapes.
pub fn validate_compliance_shapes(
    document: &str,
    shapes: &[Shape],
    metadata: &IconMetadata,
    profile: &ComplianceProfile,
) -> ValidationResult {
    let mut collector = IssueCollector::new();
    let viewbox = parse_viewbox(document);
    collect_geometry(shapes, viewbox.as_ref(), &profile.rules, &mut collector);
    check_linecap(shapes, profile, &mut collector);
    check_metadata(metadata, profile, &mut collector);
    check_naming(metadata, profile, &mut collector);
    check_effects(document, profile, &mut collector);

    let result = collector.into_compliance_result();
    debug!(
        "Compliance validation against '{}': {}/{} checks passed, score {:.1}",
        profile.name, result.checks_passed, result.checks_total, result.score
    );
    result
}

fn check_linecap(shapes: &[Shape], profile: &ComplianceProfile, collector: &mut IssueCollector) {
    let Some(required) = profile.required_linecap.as_deref() else {
        return;
    };
    for shape in shapes {
        let Some(stroke) = &shape.stroke else {
            continue;
        };
        // SVG renders a missing linecap as butt
        let cap = stroke.linecap.as_deref().unwrap_or("butt");
        collector.check(cap.eq_ignore_ascii_case(required), || {
            Issue::warning(
                "stroke.linecap",
                Category::Stroke,
                format!(
                    "Stroke linecap '{cap}' on {} (profile '{}' requires '{required}')",
                    shape.label(),
                    profile.name
                ),
            )
            .on(shape)
        });
    }
}

fn check_metadata(metadata: &IconMetadata, profile: &ComplianceProfile, collector: &mut IssueCollector) {
    let rules = &profile.metadata;
    let enumerated: [(&str, &Option<String>, &[String]); 5] = [
        ("domain", &metadata.domain, &rules.domains),
        ("function", &metadata.function, &rules.functions),
        ("userRole", &metadata.user_role, &rules.user_roles),
        ("iconType", &metadata.icon_type, &rules.icon_types),
        ("systemArea", &metadata.system_area, &rules.system_areas),
    ];
    for (field, value, allowed) in enumerated {
        let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let known = value.is_some_and(|v| allowed.iter().any(|a| a.eq_ignore_ascii_case(v)));
        collector.check(known, || {
            let message = match value {
                None => format!("Missing required metadata field '{field}'"),
                Some(v) => format!(
                    "Unknown value '{v}' for metadata field '{field}' (allowed: {})",
                    allowed.join(", ")
                ),
            };
            Issue::critical(&metadata_rule_id(field), Category::Semantics, message)
        });
    }

    let description = metadata.description.as_deref().map(str::trim).unwrap_or("");
    collector.check(
        description.chars().count() >= rules.min_description_length,
        || {
            let message = if description.is_empty() {
                "Missing required metadata field 'description'".to_string()
            } else {
                format!(
                    "Metadata description is too short ({} chars, minimum {})",
                    description.chars().count(),
                    rules.min_description_length
                )
            };
            Issue::critical("semantics.metadata.description", Category::Semantics, message)
        },
    );

    if let Some(system) = metadata.design_system.as_deref() {
        collector.check(system.trim().eq_ignore_ascii_case(&profile.name), || {
            Issue::warning(
                "semantics.design_system",
                Category::Semantics,
                format!(
                    "Metadata targets design system '{system}' but validating against '{}'",
                    profile.name
                ),
            )
        });
    }
}

fn metadata_rule_id(field: &str) -> String {
    let snake: String = field
        .chars()
        .flat_map(|c| {
            if c.is_ascii_uppercase() {
                vec!['_', c.to_ascii_lowercase()]
            } else {
                vec![c]
            }
        })
        .collect();
    format!("semantics.metadata.{snake}")
}

fn check_naming(metadata: &IconMetadata, profile: &ComplianceProfile, collector: &mut IssueCollector) {
    let Some(name) = metadata.name.as_deref() else {
        return;
    };
    collector.check(profile.naming.conforms(name), || {
        Issue::warning(
            "semantics.naming",
            Category::Semantics,
            format!(
                "Icon name '{name}' does not follow the naming convention (e.g. '{}')",
                profile.naming.example()
            ),
        )
    });
}

fn check_effects(document: &str, profile: &ComplianceProfile, collector: &mut IssueCollector) {
    let present = effects_in(document);
    for effect in Effect::ALL.into_iter().filter(|e| profile.forbids(*e)) {
        collector.check(!present.contains(&effect), || {
            Issue::critical(
                effect_rule_id(effect),
                effect_category(effect),
                format!(
                    "Forbidden effect: {} is not allowed in '{}' icons",
                    effect.as_str().replace('_', " "),
                    profile.name
                ),
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    const VALID_DOC: &str = r##"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" rx="2" stroke="#000000" stroke-width="2"/></svg>"##;

    fn metadata() -> IconMetadata {
        IconMetadata {
            design_system: Some("enterprise".to_string()),
            name: Some("document-outline".to_string()),
            domain: Some("finance".to_string()),
            function: Some("object".to_string()),
            user_role: Some("analyst".to_string()),
            icon_type: Some("ui".to_string()),
            system_area: Some("reports".to_string()),
            description: Some("A single sheet document".to_string()),
        }
    }

    fn run(doc: &str, meta: &IconMetadata) -> ValidationResult {
        validate_compliance_with(doc, meta, &ComplianceProfile::default())
    }

    #[test]
    fn test_fully_compliant_document() {
        let result = run(VALID_DOC, &metadata());
        assert!(result.is_valid, "{:?}", result.issues);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.checks_passed, result.checks_total);
    }

    #[test]
    fn test_missing_and_unknown_metadata_are_critical() {
        let mut meta = metadata();
        meta.domain = None;
        meta.user_role = Some("wizard".to_string());
        let result = run(VALID_DOC, &meta);
        assert!(!result.is_valid);
        let domain: Vec<&Issue> = result.issues_for("semantics.metadata.domain").collect();
        assert_eq!(domain[0].message, "Missing required metadata field 'domain'");
        let role: Vec<&Issue> = result.issues_for("semantics.metadata.user_role").collect();
        assert!(role[0].message.starts_with("Unknown value 'wizard'"));
        assert!(result
            .issues
            .iter()
            .all(|i| i.severity == Severity::Critical && i.category == Category::Semantics));
    }

    #[test]
    fn test_short_description_is_critical() {
        let mut meta = metadata();
        meta.description = Some("doc".to_string());
        let result = run(VALID_DOC, &meta);
        assert!(result.has_rule("semantics.metadata.description"));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_naming_and_design_system_warnings() {
        let mut meta = metadata();
        meta.name = Some("DocumentOutline".to_string());
        meta.design_system = Some("material".to_string());
        let result = run(VALID_DOC, &meta);
        assert!(result.is_valid);
        assert!(result.has_rule("semantics.naming"));
        assert!(result.has_rule("semantics.design_system"));
        assert_eq!(result.summary.warnings, 2);
        let expected = 100.0 * (result.checks_passed as f64 / result.checks_total as f64) - 10.0;
        assert!((result.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forbidden_effects() {
        let doc = r##"<svg viewBox="0 0 24 24"><defs><linearGradient id="g"/></defs><rect x="4" y="4" width="16" height="16" transform="skewX(10)" filter="url(#f)"/></svg>"##;
        let result = run(doc, &metadata());
        assert!(!result.is_valid);
        assert!(result.has_rule("effects.gradient"));
        assert!(result.has_rule("effects.filter"));
        assert!(result.has_rule("perspective.transform"));
        assert!(!result.has_rule("effects.mask"));
        assert_eq!(
            effects_in(doc),
            vec![Effect::Gradient, Effect::Filter, Effect::SkewTransform]
        );
    }

    #[test]
    fn test_plain_rotate_transform_is_allowed() {
        assert!(effects_in(r#"<path transform="rotate(45 12 12)" d="M4 4"/>"#).is_empty());
        assert_eq!(
            effects_in(r#"<g style="filter: drop-shadow(1px 1px)">"#),
            vec![Effect::Filter, Effect::DropShadow]
        );
    }

    #[test]
    fn test_required_linecap() {
        let profile = ComplianceProfile {
            required_linecap: Some("square".to_string()),
            ..ComplianceProfile::default()
        };
        let result = validate_compliance_with(VALID_DOC, &metadata(), &profile);
        assert!(result.is_valid);
        assert!(result.has_rule("stroke.linecap"));
    }

    #[test]
    fn test_empty_document_fails_primary() {
        let result = run("", &metadata());
        assert!(!result.is_valid);
        assert!(result.has_rule("composition.primary"));
    }

    #[test]
    fn test_metadata_rule_ids() {
        assert_eq!(metadata_rule_id("systemArea"), "semantics.metadata.system_area");
        assert_eq!(metadata_rule_id("domain"), "semantics.metadata.domain");
    }
}
