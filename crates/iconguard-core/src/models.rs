//! Shared typed records produced and consumed by the extractor and validators.
//!
//! Every record here is a plain value: produced fresh per validation call,
//! never mutated by the pipeline afterwards, and serializable to JSON so the
//! engine can sit behind any transport.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Geometry primitives
// ---------------------------------------------------------------------------

/// The supported vector primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Path,
}

impl ShapeKind {
    /// Map a markup tag name to a primitive kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rect" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            "line" => Some(Self::Line),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// The markup tag this kind was read from.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Rectangle => "rect",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Path => "path",
        }
    }
}

/// Axis-aligned bounding box in document units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Build a box, clamping negative extents to zero.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Build a box from min/max corners.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Strict AABB intersection; boxes that only touch do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// True if the whole box lies inside the square `[min, max]` on both axes.
    pub fn within(&self, min: f64, max: f64) -> bool {
        self.x >= min && self.y >= min && self.right() <= max && self.bottom() <= max
    }
}

/// Declared drawing canvas (`viewBox`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// A square canvas anchored at the origin.
    pub fn square(size: f64) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: size,
            height: size,
        }
    }
}

impl std::fmt::Display for ViewBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

// ---------------------------------------------------------------------------
// 2. Shape
// ---------------------------------------------------------------------------

/// Stroke styling of a shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f64,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linecap: Option<String>,
}

/// Contribution of a shape to the icon's metaphor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Primary,
    Supporting,
    Decoration,
}

/// Ornament sub-type for decoration shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    Sparkle,
    Dot,
}

/// One geometric primitive extracted from a vector document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Position among the drawable elements, in document order.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: ShapeKind,
    pub bounds: Bounds,
    pub stroke: Option<Stroke>,
    pub fill: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    /// Line angle in whole degrees, normalized to `[0, 180)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoration_kind: Option<DecorationKind>,
    /// Coordinate attributes as written in the document, in attribute order.
    pub coordinates: IndexMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_data: Option<String>,
}

impl Shape {
    pub fn is_decoration(&self) -> bool {
        self.role == Role::Decoration
    }

    /// Stroke width, falling back to zero for unstroked shapes.
    pub fn stroke_width(&self) -> f64 {
        self.stroke.as_ref().map_or(0.0, |s| s.width)
    }

    /// The dimension that decides whether the shape survives downscaling.
    ///
    /// Lines use their length; degenerate boxes (one axis collapsed, as with a
    /// straight path) use the remaining axis; everything else the smaller side.
    pub fn legible_extent(&self) -> f64 {
        let Bounds { width, height, .. } = self.bounds;
        if self.kind == ShapeKind::Line {
            return width.hypot(height);
        }
        if width == 0.0 || height == 0.0 {
            width.max(height)
        } else {
            width.min(height)
        }
    }

    /// Human-readable handle used in issue messages.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{} '{}'", self.kind.tag(), id),
            None => format!("{} #{}", self.kind.tag(), self.index + 1),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Issues and validation results
// ---------------------------------------------------------------------------

/// Issue severity; `Critical` blocks validity. Ordered `Info < Warning < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Rule family an issue belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Geometry,
    Stroke,
    Perspective,
    Composition,
    Accessibility,
    Semantics,
    Decoration,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::Stroke => "stroke",
            Self::Perspective => "perspective",
            Self::Composition => "composition",
            Self::Accessibility => "accessibility",
            Self::Semantics => "semantics",
            Self::Decoration => "decoration",
        }
    }
}

/// One rule violation or advisory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_index: Option<usize>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        rule_id: &str,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            rule_id: rule_id.to_string(),
            message: message.into(),
            category,
            shape_index: None,
        }
    }

    pub fn critical(rule_id: &str, category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, rule_id, category, message)
    }

    pub fn warning(rule_id: &str, category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule_id, category, message)
    }

    pub fn info(rule_id: &str, category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule_id, category, message)
    }

    /// Attach the offending shape.
    pub fn on(mut self, shape: &Shape) -> Self {
        self.shape_index = Some(shape.index);
        self
    }
}

/// Issue counts per severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Summary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut acc, issue| {
            match issue.severity {
                Severity::Critical => acc.critical += 1,
                Severity::Warning => acc.warnings += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }
}

/// Output of the geometry and compliance validators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Issues in the order the rules fired; never deduplicated.
    pub issues: Vec<Issue>,
    pub summary: Summary,
    /// 0..=100, derived deterministically from the summary.
    pub score: f64,
    pub checks_passed: usize,
    pub checks_total: usize,
}

impl ValidationResult {
    pub fn has_rule(&self, rule_id: &str) -> bool {
        self.issues.iter().any(|issue| issue.rule_id == rule_id)
    }

    pub fn issues_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |issue| issue.rule_id == rule_id)
    }
}

// ---------------------------------------------------------------------------
// 4. Complexity
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityRating {
    Low,
    Medium,
    High,
}

/// The five normalized factors, each in `[0, 1]` before weighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityFactors {
    pub element_count: f64,
    pub metaphor_clarity: f64,
    pub visual_balance: f64,
    pub small_size_readability: f64,
    pub stroke_complexity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeKind {
    Simplified,
    MaterialStyle,
    CarbonStyle,
    CustomRefinement,
}

/// A remediation suggestion, ranked by confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub kind: AlternativeKind,
    pub description: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    pub score: f64,
    pub rating: ComplexityRating,
    pub factors: ComplexityFactors,
    pub flags: Vec<String>,
    pub alternatives: Vec<Alternative>,
}

impl ComplexityAnalysis {
    pub fn has_flag(&self, needle: &str) -> bool {
        self.flags.iter().any(|flag| flag.contains(needle))
    }
}

// ---------------------------------------------------------------------------
// 5. Design-system metadata
// ---------------------------------------------------------------------------

/// Domain context supplied alongside a candidate for compliance validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IconMetadata {
    pub design_system: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub function: Option<String>,
    pub user_role: Option<String>,
    pub icon_type: Option<String>,
    pub system_area: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// 6. Multi-size preview
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewFlagKind {
    StrokeTooThin,
    PathTooComplex,
    DetailTooSmall,
    TooDense,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewFlag {
    pub kind: PreviewFlagKind,
    pub message: String,
}

/// Predicted legibility at one render size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerSizeResult {
    pub size: u32,
    pub clarity_score: f64,
    pub is_recognizable: bool,
    pub flags: Vec<PreviewFlag>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewReport {
    pub results: Vec<PerSizeResult>,
    pub overall_score: f64,
    pub passed_sizes: Vec<u32>,
    pub failed_sizes: Vec<u32>,
}

// ---------------------------------------------------------------------------
// 7. Correction
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Deterministic document transforms that fix an issue without regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFix {
    StrokeWidth,
    ViewBox,
    StripEffects,
    RoundCoordinates,
}

/// One instruction in a correction directive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectiveEntry {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub instruction: String,
    pub worked_example: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrectionDirective {
    pub entries: Vec<DirectiveEntry>,
    pub priority: Priority,
    pub attempt: u32,
    pub auto_fixes: Vec<AutoFix>,
}

// ---------------------------------------------------------------------------
// 8. Set consistency
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualStyle {
    Outlined,
    Filled,
    Rounded,
    Geometric,
}

impl VisualStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outlined => "outlined",
            Self::Filled => "filled",
            Self::Rounded => "rounded",
            Self::Geometric => "geometric",
        }
    }
}

/// min/max/avg of one scalar across a set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl ScalarStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Self { min, max, avg }
    }
}

/// Per-icon summary used both for set aggregation and for the candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconSummary {
    pub name: String,
    pub stroke_weight: f64,
    pub corner_radius: f64,
    pub element_count: usize,
    pub style: VisualStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metaphor: Option<String>,
}

/// Metaphor token contributed by one sibling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingToken {
    pub name: String,
    pub token: String,
}

/// Aggregate over the current sibling set; recomputed on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IconSetStats {
    pub icon_count: usize,
    pub stroke_weight: ScalarStats,
    pub corner_radius: ScalarStats,
    pub element_count: ScalarStats,
    pub dominant_styles: Vec<VisualStyle>,
    pub dominant_metaphors: Vec<String>,
    pub sibling_tokens: Vec<SiblingToken>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    pub property: String,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaphorMatch {
    Exact,
    Synonym,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaphorConflict {
    pub sibling: String,
    pub candidate_token: String,
    pub sibling_token: String,
    pub match_kind: MetaphorMatch,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyResult {
    pub is_consistent: bool,
    pub consistency_score: f64,
    pub violations: Vec<ConsistencyViolation>,
    pub recommendations: Vec<String>,
    pub metaphor_conflicts: Vec<MetaphorConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(kind: ShapeKind, bounds: Bounds) -> Shape {
        Shape {
            index: 0,
            id: None,
            kind,
            bounds,
            stroke: None,
            fill: "none".to_string(),
            corner_radius: None,
            angle: None,
            role: Role::Primary,
            decoration_kind: None,
            coordinates: IndexMap::new(),
            path_data: None,
        }
    }

    #[test]
    fn test_bounds_touching_edges_do_not_overlap() {
        let a = Bounds::new(0.0, 0.0, 4.0, 4.0);
        let b = Bounds::new(4.0, 0.0, 4.0, 4.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        let c = Bounds::new(3.0, 3.0, 4.0, 4.0);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_bounds_clamp_negative_extent() {
        let b = Bounds::new(2.0, 2.0, -5.0, 3.0);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 3.0);
    }

    #[test]
    fn test_legible_extent_per_kind() {
        let line = shape(ShapeKind::Line, Bounds::new(4.0, 12.0, 16.0, 0.0));
        assert_eq!(line.legible_extent(), 16.0);
        let flat_path = shape(ShapeKind::Path, Bounds::new(4.0, 12.0, 10.0, 0.0));
        assert_eq!(flat_path.legible_extent(), 10.0);
        let rect = shape(ShapeKind::Rectangle, Bounds::new(4.0, 4.0, 16.0, 1.0));
        assert_eq!(rect.legible_extent(), 1.0);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_summary_counts() {
        let issues = vec![
            Issue::critical("a", Category::Geometry, "x"),
            Issue::warning("b", Category::Stroke, "y"),
            Issue::warning("c", Category::Stroke, "z"),
            Issue::info("d", Category::Composition, "w"),
        ];
        let summary = Summary::from_issues(&issues);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.info, 1);
    }

    #[test]
    fn test_issues_for_filters_by_rule_id() {
        let issues = vec![
            Issue::warning("stroke.color", Category::Stroke, "first"),
            Issue::critical("stroke.width", Category::Stroke, "second"),
            Issue::warning("stroke.color", Category::Stroke, "third"),
        ];
        let result = ValidationResult {
            is_valid: false,
            summary: Summary::from_issues(&issues),
            issues,
            score: 70.0,
            checks_passed: 1,
            checks_total: 4,
        };
        let rule_id = format!("stroke.{}", "color");
        let messages: Vec<&str> = result
            .issues_for(&rule_id)
            .map(|issue| issue.message.as_str())
            .collect();
        assert_eq!(messages, vec!["first", "third"]);
        assert_eq!(result.issues_for("geometry.canvas").count(), 0);
    }

    #[test]
    fn test_metadata_camel_case_json() {
        let meta: IconMetadata = serde_json::from_str(
            r#"{"domain":"finance","userRole":"analyst","systemArea":"reports"}"#,
        )
        .unwrap();
        assert_eq!(meta.user_role.as_deref(), Some("analyst"));
        assert_eq!(meta.system_area.as_deref(), Some("reports"));
        assert!(meta.function.is_none());
    }
}
