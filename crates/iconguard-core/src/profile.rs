//! Rule tables: the generic geometry profile and the design-system layer on top.
//!
//! The built-in tables are the canonical 24-unit grid. A JSON override can be
//! supplied through `ICONGUARD_PROFILE`; it is read once, on first use of
//! [`active_profile`], and never changes for the life of the process.

use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{IconGuardError, IconGuardResult};
use crate::models::ViewBox;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Version stamped into the built-in tables.
pub const PROFILE_VERSION: u32 = 1;

/// Environment variable naming a JSON compliance profile to load at startup.
pub const PROFILE_ENV: &str = "ICONGUARD_PROFILE";

pub const CANONICAL_CANVAS: f64 = 24.0;
pub const CANONICAL_STROKE_WIDTH: f64 = 2.0;
pub const CANONICAL_VIEWBOX: &str = "0 0 24 24";

/// Render sizes the preview validator evaluates by default.
pub const PREVIEW_SIZES: [u32; 5] = [16, 20, 24, 32, 48];

const DEFAULT_STROKE_COLORS: &[&str] = &["#000000", "black"];
const DEFAULT_FILL_WHITELIST: &[&str] = &["#000000", "black", "currentColor", "#ffffff", "white"];
const DEFAULT_CORNER_RADII: &[f64] = &[0.0, 2.0];
const DEFAULT_ANGLES: &[f64] = &[
    0.0, 15.0, 30.0, 45.0, 60.0, 90.0, 120.0, 135.0, 150.0, 180.0,
];

const DEFAULT_DOMAINS: &[&str] = &[
    "general",
    "finance",
    "healthcare",
    "commerce",
    "security",
    "analytics",
    "communication",
    "logistics",
];
const DEFAULT_FUNCTIONS: &[&str] = &["action", "navigation", "status", "object", "concept", "data"];
const DEFAULT_USER_ROLES: &[&str] = &["end-user", "admin", "operator", "analyst", "developer"];
const DEFAULT_ICON_TYPES: &[&str] = &["ui", "pictogram", "product"];
const DEFAULT_SYSTEM_AREAS: &[&str] = &[
    "dashboard",
    "settings",
    "reports",
    "workflow",
    "notifications",
    "data",
    "account",
];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Generic geometry profile
// ---------------------------------------------------------------------------

/// Canvas, stroke, decoration and hierarchy limits shared by every validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleProfile {
    pub version: u32,
    pub canvas_size: f64,
    pub live_area_padding: f64,
    pub stroke_width: f64,
    pub stroke_colors: Vec<String>,
    pub corner_radii: Vec<f64>,
    pub allowed_angles: Vec<f64>,
    pub fill_whitelist: Vec<String>,
    pub min_element_size: f64,
    pub max_path_length: usize,
    pub max_sparkles: usize,
    pub max_dots: usize,
    pub max_supporting: usize,
}

impl Default for RuleProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            canvas_size: CANONICAL_CANVAS,
            live_area_padding: 2.0,
            stroke_width: CANONICAL_STROKE_WIDTH,
            stroke_colors: owned(DEFAULT_STROKE_COLORS),
            corner_radii: DEFAULT_CORNER_RADII.to_vec(),
            allowed_angles: DEFAULT_ANGLES.to_vec(),
            fill_whitelist: owned(DEFAULT_FILL_WHITELIST),
            min_element_size: 2.0,
            max_path_length: 200,
            max_sparkles: 3,
            max_dots: 5,
            max_supporting: 2,
        }
    }
}

impl RuleProfile {
    pub fn from_json_str(json: &str) -> IconGuardResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject tables that would make every icon fail or every check vacuous.
    pub fn validate(&self) -> IconGuardResult<()> {
        if !(self.canvas_size > 0.0) {
            return Err(IconGuardError::Profile(format!(
                "canvas_size must be positive, got {}",
                self.canvas_size
            )));
        }
        if self.live_area_padding < 0.0 || self.live_area_padding * 2.0 >= self.canvas_size {
            return Err(IconGuardError::Profile(format!(
                "live_area_padding {} does not leave a live area on a {} canvas",
                self.live_area_padding, self.canvas_size
            )));
        }
        if !(self.stroke_width > 0.0) {
            return Err(IconGuardError::Profile(format!(
                "stroke_width must be positive, got {}",
                self.stroke_width
            )));
        }
        Ok(())
    }

    pub fn canonical_viewbox(&self) -> ViewBox {
        ViewBox::square(self.canvas_size)
    }

    /// Inclusive bounds of the live area on both axes.
    pub fn live_area(&self) -> (f64, f64) {
        (
            self.live_area_padding,
            self.canvas_size - self.live_area_padding,
        )
    }

    pub fn accepts_stroke_color(&self, color: &str) -> bool {
        let color = color.trim();
        self.stroke_colors
            .iter()
            .any(|allowed| allowed == color)
    }

    pub fn accepts_fill(&self, fill: &str) -> bool {
        let fill = fill.trim();
        fill.is_empty()
            || fill.eq_ignore_ascii_case("none")
            || fill.eq_ignore_ascii_case("transparent")
            || self
                .fill_whitelist
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(fill))
    }

    pub fn accepts_corner_radius(&self, radius: f64) -> bool {
        self.corner_radii.iter().any(|r| (r - radius).abs() < f64::EPSILON)
    }

    pub fn accepts_angle(&self, angle: f64) -> bool {
        self.allowed_angles
            .iter()
            .any(|a| (a - angle).abs() < f64::EPSILON)
    }
}

// ---------------------------------------------------------------------------
// Design-system layer
// ---------------------------------------------------------------------------

/// Enumerations the metadata fields are checked against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRules {
    pub domains: Vec<String>,
    pub functions: Vec<String>,
    pub user_roles: Vec<String>,
    pub icon_types: Vec<String>,
    pub system_areas: Vec<String>,
    pub min_description_length: usize,
}

impl Default for MetadataRules {
    fn default() -> Self {
        Self {
            domains: owned(DEFAULT_DOMAINS),
            functions: owned(DEFAULT_FUNCTIONS),
            user_roles: owned(DEFAULT_USER_ROLES),
            icon_types: owned(DEFAULT_ICON_TYPES),
            system_areas: owned(DEFAULT_SYSTEM_AREAS),
            min_description_length: 10,
        }
    }
}

/// Token-separated naming convention, e.g. `arrow-left-circle`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    pub separator: String,
    pub lowercase: bool,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            lowercase: true,
        }
    }
}

impl NamingRules {
    pub fn conforms(&self, name: &str) -> bool {
        if name.is_empty() || self.separator.is_empty() {
            return false;
        }
        name.split(self.separator.as_str()).all(|token| {
            !token.is_empty()
                && token.chars().all(|c| c.is_ascii_alphanumeric())
                && (!self.lowercase || !token.chars().any(|c| c.is_ascii_uppercase()))
        })
    }

    pub fn example(&self) -> String {
        ["arrow", "left", "circle"].join(&self.separator)
    }
}

/// Visual effects a flat icon system may prohibit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Gradient,
    Filter,
    Mask,
    ClipPath,
    DropShadow,
    SkewTransform,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::Gradient,
        Effect::Filter,
        Effect::Mask,
        Effect::ClipPath,
        Effect::DropShadow,
        Effect::SkewTransform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gradient => "gradient",
            Self::Filter => "filter",
            Self::Mask => "mask",
            Self::ClipPath => "clip_path",
            Self::DropShadow => "drop_shadow",
            Self::SkewTransform => "skew_transform",
        }
    }
}

/// A named, swappable design-system table layered over [`RuleProfile`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceProfile {
    pub name: String,
    pub rules: RuleProfile,
    pub metadata: MetadataRules,
    pub naming: NamingRules,
    pub forbidden_effects: Vec<Effect>,
    pub required_linecap: Option<String>,
}

impl Default for ComplianceProfile {
    fn default() -> Self {
        Self {
            name: "enterprise".to_string(),
            rules: RuleProfile::default(),
            metadata: MetadataRules::default(),
            naming: NamingRules::default(),
            forbidden_effects: Effect::ALL.to_vec(),
            required_linecap: None,
        }
    }
}

impl ComplianceProfile {
    pub fn from_json_str(json: &str) -> IconGuardResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_path(path: &Path) -> IconGuardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> IconGuardResult<()> {
        if self.name.trim().is_empty() {
            return Err(IconGuardError::Profile(
                "compliance profile name must not be empty".to_string(),
            ));
        }
        self.rules.validate()
    }

    pub fn forbids(&self, effect: Effect) -> bool {
        self.forbidden_effects.contains(&effect)
    }
}

// ---------------------------------------------------------------------------
// Process-wide active profile
// ---------------------------------------------------------------------------

static ACTIVE_PROFILE: LazyLock<ComplianceProfile> = LazyLock::new(load_active_profile);

/// The profile in force for this process, initialised on first use.
pub fn active_profile() -> &'static ComplianceProfile {
    &ACTIVE_PROFILE
}

fn load_active_profile() -> ComplianceProfile {
    let path = match std::env::var(PROFILE_ENV) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => return ComplianceProfile::default(),
    };
    match ComplianceProfile::from_path(Path::new(&path)) {
        Ok(profile) => {
            info!(
                "Loaded compliance profile '{}' (v{}) from {path}",
                profile.name, profile.rules.version
            );
            profile
        }
        Err(e) => {
            warn!("Failed to load compliance profile from {path}: {e}; using built-in table");
            ComplianceProfile::default()
        }
    }
}
