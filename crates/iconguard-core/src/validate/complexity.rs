//! Weighted complexity scoring and readability flags.
//!
//! Five factors are normalized to `[0, 1]` and combined with fixed weights.
//! The weights and thresholds are empirical; they are kept together here so
//! they can be tuned without touching the scoring code.

use std::collections::HashSet;

use tracing::debug;

use crate::extract::path_data::{count_commands, CommandCounts};
use crate::models::{
    Alternative, AlternativeKind, ComplexityAnalysis, ComplexityFactors, ComplexityRating, Role,
    Shape,
};
use crate::validate::geometry::overlapping_pairs;

// ---------------------------------------------------------------------------
// Weights and thresholds
// ---------------------------------------------------------------------------

pub const ELEMENT_COUNT_WEIGHT: f64 = 0.30;
pub const METAPHOR_CLARITY_WEIGHT: f64 = 0.25;
pub const VISUAL_BALANCE_WEIGHT: f64 = 0.20;
pub const SMALL_SIZE_WEIGHT: f64 = 0.15;
pub const STROKE_COMPLEXITY_WEIGHT: f64 = 0.10;

pub const LOW_THRESHOLD: f64 = 0.4;
pub const HIGH_THRESHOLD: f64 = 0.7;

const MAX_MAIN_ELEMENTS: usize = 3;
const MAX_DECORATIONS: usize = 2;
const MAX_DISTINCT_KINDS: usize = 4;
const MIN_DESCRIPTION_CHARS: usize = 10;
const AREA_HIGH_RATIO: f64 = 3.0;
const AREA_LOW_RATIO: f64 = 0.3;
const MAX_OVERLAP_PAIRS: usize = 2;
const MIN_DIMENSION: f64 = 2.0;
const FINE_DETAIL_DIMENSION: f64 = 4.0;
const MAX_FINE_DETAILS: usize = 2;
const MODERATE_PATH_COMMANDS: usize = 20;
const HEAVY_PATH_COMMANDS: usize = 40;

pub const FLAG_MULTIPLE_METAPHORS: &str = "Multiple competing metaphors";

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Score a shape set. Pure and order-independent.
pub fn analyze_complexity(shapes: &[Shape], description: Option<&str>) -> ComplexityAnalysis {
    let mut flags = Vec::new();
    let factors = ComplexityFactors {
        element_count: element_count_factor(shapes, &mut flags),
        metaphor_clarity: metaphor_clarity_factor(shapes, description, &mut flags),
        visual_balance: visual_balance_factor(shapes, &mut flags),
        small_size_readability: readability_factor(shapes, &mut flags),
        stroke_complexity: stroke_complexity_factor(shapes, &mut flags),
    };

    let score = (factors.element_count * ELEMENT_COUNT_WEIGHT
        + factors.metaphor_clarity * METAPHOR_CLARITY_WEIGHT
        + factors.visual_balance * VISUAL_BALANCE_WEIGHT
        + factors.small_size_readability * SMALL_SIZE_WEIGHT
        + factors.stroke_complexity * STROKE_COMPLEXITY_WEIGHT)
        .clamp(0.0, 1.0);

    let mut rating = rating_for(score);
    // competing metaphors never read as a simple icon
    if flags.iter().any(|f: &String| f.starts_with(FLAG_MULTIPLE_METAPHORS)) {
        rating = rating.max(ComplexityRating::Medium);
    }

    debug!(
        "Complexity analysis: {} shapes, score {score:.3}, {} flags",
        shapes.len(),
        flags.len()
    );

    ComplexityAnalysis {
        score,
        rating,
        factors,
        flags,
        alternatives: alternatives_for(score),
    }
}

pub fn rating_for(score: f64) -> ComplexityRating {
    if score <= LOW_THRESHOLD {
        ComplexityRating::Low
    } else if score <= HIGH_THRESHOLD {
        ComplexityRating::Medium
    } else {
        ComplexityRating::High
    }
}

fn excess(count: usize, limit: usize) -> f64 {
    count.saturating_sub(limit) as f64
}

fn element_count_factor(shapes: &[Shape], flags: &mut Vec<String>) -> f64 {
    let decorations = shapes.iter().filter(|s| s.is_decoration()).count();
    let main = shapes.len() - decorations;
    if main > MAX_MAIN_ELEMENTS {
        flags.push(format!("Too many main elements ({main})"));
    }
    if decorations > MAX_DECORATIONS {
        flags.push(format!("Too many decorative elements ({decorations})"));
    }
    (excess(main, MAX_MAIN_ELEMENTS) * 0.25 + excess(decorations, MAX_DECORATIONS) * 0.2).min(1.0)
}

fn metaphor_clarity_factor(
    shapes: &[Shape],
    description: Option<&str>,
    flags: &mut Vec<String>,
) -> f64 {
    let mut factor: f64 = 0.0;
    let primaries = shapes.iter().filter(|s| s.role == Role::Primary).count();
    if primaries > 1 {
        flags.push(format!(
            "{FLAG_MULTIPLE_METAPHORS} ({primaries} primary elements)"
        ));
        factor += 0.5;
    }
    let described = description
        .map(str::trim)
        .is_some_and(|d| d.chars().count() >= MIN_DESCRIPTION_CHARS);
    if !described {
        flags.push("Missing or vague semantic description".to_string());
        factor += 0.3;
    }
    let kinds: HashSet<_> = shapes.iter().map(|s| s.kind).collect();
    if kinds.len() > MAX_DISTINCT_KINDS {
        flags.push(format!("Too many distinct shape types ({})", kinds.len()));
        factor += 0.2;
    }
    factor.min(1.0)
}

/// Bounding-box area with each side floored at one unit, so lines still weigh in.
fn visual_area(shape: &Shape) -> f64 {
    shape.bounds.width.max(1.0) * shape.bounds.height.max(1.0)
}

fn visual_balance_factor(shapes: &[Shape], flags: &mut Vec<String>) -> f64 {
    let mut factor: f64 = 0.0;
    let areas: Vec<f64> = shapes
        .iter()
        .filter(|s| !s.is_decoration())
        .map(visual_area)
        .collect();
    if areas.len() >= 2 {
        let mean = areas.iter().sum::<f64>() / areas.len() as f64;
        let outliers = areas
            .iter()
            .filter(|a| **a > mean * AREA_HIGH_RATIO || **a < mean * AREA_LOW_RATIO)
            .count();
        if outliers > 0 {
            flags.push(format!("Unbalanced element sizes ({outliers} outliers)"));
            factor += (outliers as f64 * 0.2).min(0.6);
        }
    }
    let pairs = overlapping_pairs(shapes).len();
    if pairs > MAX_OVERLAP_PAIRS {
        flags.push(format!("Crowded composition ({pairs} overlapping pairs)"));
        factor += 0.4;
    }
    factor.min(1.0)
}

fn readability_factor(shapes: &[Shape], flags: &mut Vec<String>) -> f64 {
    let mut factor: f64 = 0.0;
    if shapes.iter().any(|s| s.legible_extent() < MIN_DIMENSION) {
        flags.push("Details too small for 16px rendering".to_string());
        factor += 0.6;
    }
    let fine = shapes
        .iter()
        .filter(|s| s.legible_extent() < FINE_DETAIL_DIMENSION)
        .count();
    if fine > MAX_FINE_DETAILS {
        flags.push(format!("Too many fine details ({fine})"));
        factor += 0.4;
    }
    factor.min(1.0)
}

fn stroke_complexity_factor(shapes: &[Shape], flags: &mut Vec<String>) -> f64 {
    let mut counts = CommandCounts::default();
    for d in shapes.iter().filter_map(|s| s.path_data.as_deref()) {
        counts.add(count_commands(d));
    }
    let mut factor: f64 = if counts.total > HEAVY_PATH_COMMANDS {
        0.7
    } else if counts.total > MODERATE_PATH_COMMANDS {
        0.4
    } else {
        0.0
    };
    if factor > 0.0 {
        flags.push(format!("Complex path data ({} commands)", counts.total));
    }
    if counts.curves > counts.straight {
        flags.push(format!(
            "Curve-heavy paths ({} curves vs {} straight)",
            counts.curves, counts.straight
        ));
        factor += 0.3;
    }
    factor.min(1.0)
}

fn alternatives_for(score: f64) -> Vec<Alternative> {
    let mut alternatives = Vec::new();
    if score > HIGH_THRESHOLD {
        alternatives.push(Alternative {
            kind: AlternativeKind::Simplified,
            description: format!(
                "Reduce to one primary shape with at most {MAX_MAIN_ELEMENTS} main elements"
            ),
            confidence: 0.85,
        });
    }
    if score > LOW_THRESHOLD {
        alternatives.push(Alternative {
            kind: AlternativeKind::MaterialStyle,
            description: "Redraw on a Material-style keyline grid with 2px strokes".to_string(),
            confidence: 0.7,
        });
        alternatives.push(Alternative {
            kind: AlternativeKind::CarbonStyle,
            description: "Redraw with Carbon-style geometric construction and flat ends"
                .to_string(),
            confidence: 0.65,
        });
    }
    alternatives.push(Alternative {
        kind: AlternativeKind::CustomRefinement,
        description: "Refine the current drawing against the flagged conditions".to_string(),
        confidence: 0.5,
    });
    alternatives.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    alternatives
}
