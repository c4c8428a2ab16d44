//! Legibility prediction at a sequence of target render sizes.
//!
//! Each size is evaluated independently from the same immutable shapes. A size
//! starts at a clarity of 100 and loses a fixed penalty for every flag kind
//! that fires; each kind fires at most once per size.

use tracing::debug;

use crate::extract::path_data::count_commands;
use crate::models::{PerSizeResult, PreviewFlag, PreviewFlagKind, PreviewReport, Shape};
use crate::profile::CANONICAL_CANVAS;

const SMALL_SIZE: u32 = 20;
const MIN_STROKE_RATIO_SMALL: f64 = 0.08;
const MIN_STROKE_RATIO: f64 = 0.06;
const MIN_RENDERED_DETAIL: f64 = 2.0;
const MAX_DENSE_ELEMENTS: usize = 8;
const RECOGNIZABLE_CLARITY: f64 = 60.0;
const MAX_RECOGNIZABLE_FLAGS: usize = 2;

impl PreviewFlagKind {
    pub fn penalty(&self) -> f64 {
        match self {
            Self::StrokeTooThin => 20.0,
            Self::PathTooComplex => 15.0,
            Self::DetailTooSmall => 10.0,
            Self::TooDense => 10.0,
        }
    }
}

fn min_stroke_ratio(size: u32) -> f64 {
    if size <= SMALL_SIZE {
        MIN_STROKE_RATIO_SMALL
    } else {
        MIN_STROKE_RATIO
    }
}

/// Largest command count a single path may carry before detail is lost.
pub fn command_ceiling(size: u32) -> usize {
    match size {
        0..=16 => 15,
        17..=24 => 25,
        25..=32 => 35,
        _ => 50,
    }
}

pub fn validate_at_sizes(shapes: &[Shape], sizes: &[u32]) -> Vec<PerSizeResult> {
    sizes.iter().map(|size| validate_at_size(shapes, *size)).collect()
}

pub fn validate_at_size(shapes: &[Shape], size: u32) -> PerSizeResult {
    let scale = f64::from(size) / CANONICAL_CANVAS;
    let mut flags = Vec::new();

    let thinnest = shapes
        .iter()
        .filter_map(|s| s.stroke.as_ref().map(|stroke| stroke.width))
        .min_by(f64::total_cmp);
    if let Some(width) = thinnest {
        let ratio = width / CANONICAL_CANVAS;
        let minimum = min_stroke_ratio(size);
        if ratio < minimum {
            flags.push(PreviewFlag {
                kind: PreviewFlagKind::StrokeTooThin,
                message: format!(
                    "Stroke renders at {:.2}px at {size}px (ratio {ratio:.3}, minimum {minimum})",
                    width * scale
                ),
            });
        }
    }

    let ceiling = command_ceiling(size);
    let busiest = shapes
        .iter()
        .filter_map(|s| s.path_data.as_deref().map(|d| (s, count_commands(d).total)))
        .filter(|(_, commands)| *commands > ceiling)
        .max_by_key(|(_, commands)| *commands);
    if let Some((shape, commands)) = busiest {
        flags.push(PreviewFlag {
            kind: PreviewFlagKind::PathTooComplex,
            message: format!(
                "{} has {commands} path commands (ceiling {ceiling} at {size}px)",
                shape.label()
            ),
        });
    }

    let too_small: Vec<String> = shapes
        .iter()
        .filter(|s| s.legible_extent() * scale < MIN_RENDERED_DETAIL)
        .map(Shape::label)
        .collect();
    if !too_small.is_empty() {
        flags.push(PreviewFlag {
            kind: PreviewFlagKind::DetailTooSmall,
            message: format!(
                "Details under {MIN_RENDERED_DETAIL}px at {size}px: {}",
                too_small.join(", ")
            ),
        });
    }

    let main = shapes.iter().filter(|s| !s.is_decoration()).count();
    if main > MAX_DENSE_ELEMENTS {
        flags.push(PreviewFlag {
            kind: PreviewFlagKind::TooDense,
            message: format!("{main} elements crowd the {size}px render (max {MAX_DENSE_ELEMENTS})"),
        });
    }

    let penalty: f64 = flags.iter().map(|f| f.kind.penalty()).sum();
    let clarity_score = (100.0 - penalty).max(0.0);
    PerSizeResult {
        size,
        clarity_score,
        is_recognizable: clarity_score >= RECOGNIZABLE_CLARITY && flags.len() <= MAX_RECOGNIZABLE_FLAGS,
        flags,
    }
}

/// Per-size results plus the mean clarity and the passed/failed partition.
pub fn preview_report(shapes: &[Shape], sizes: &[u32]) -> PreviewReport {
    let results = validate_at_sizes(shapes, sizes);
    let overall_score = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.clarity_score).sum::<f64>() / results.len() as f64
    };
    let (passed, failed): (Vec<&PerSizeResult>, Vec<&PerSizeResult>) =
        results.iter().partition(|r| r.is_recognizable);
    let passed_sizes: Vec<u32> = passed.iter().map(|r| r.size).collect();
    let failed_sizes: Vec<u32> = failed.iter().map(|r| r.size).collect();
    debug!(
        "Preview: {} sizes, overall {:.1}, failed {:?}",
        results.len(),
        overall_score,
        failed_sizes
    );
    PreviewReport {
        results,
        overall_score,
        passed_sizes,
        failed_sizes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::profile::PREVIEW_SIZES;

    const VALID_RECT: &str = r##"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" rx="2" stroke="#000000" stroke-width="2"/></svg>"##;

    #[test]
    fn test_valid_icon_clear_at_every_size() {
        let report = preview_report(&extract(VALID_RECT), &PREVIEW_SIZES);
        assert_eq!(report.results.len(), 5);
        assert!(report.results.iter().all(|r| r.flags.is_empty()));
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.passed_sizes, PREVIEW_SIZES.to_vec());
        assert!(report.failed_sizes.is_empty());
    }

    #[test]
    fn test_thin_stroke_stricter_at_small_sizes() {
        let doc = VALID_RECT.replace(r#"stroke-width="2""#, r#"stroke-width="1.5""#);
        let results = validate_at_sizes(&extract(&doc), &[16, 24]);
        assert_eq!(results[0].flags.len(), 1);
        assert_eq!(results[0].flags[0].kind, PreviewFlagKind::StrokeTooThin);
        assert_eq!(results[0].clarity_score, 80.0);
        assert!(results[0].is_recognizable);
        assert!(results[1].flags.is_empty());
    }

    #[test]
    fn test_path_ceiling_depends_on_size() {
        let d: String = (0..20).map(|i| format!("L{} {} ", 4 + i % 10, 6)).collect();
        let doc = format!(r#"<svg><path d="M4 4 {d}"/></svg>"#);
        let results = validate_at_sizes(&extract(&doc), &[16, 24]);
        assert!(results[0]
            .flags
            .iter()
            .any(|f| f.kind == PreviewFlagKind::PathTooComplex));
        assert!(!results[1]
            .flags
            .iter()
            .any(|f| f.kind == PreviewFlagKind::PathTooComplex));
    }

    #[test]
    fn test_small_detail_and_density_flags_fire_once() {
        let mut body = String::new();
        for i in 0..9 {
            body.push_str(&format!(r#"<rect x="{}" y="4" width="2" height="2"/>"#, 2 + 2 * i));
        }
        let result = validate_at_size(&extract(&format!("<svg>{body}</svg>")), 16);
        let kinds: Vec<PreviewFlagKind> = result.flags.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![PreviewFlagKind::DetailTooSmall, PreviewFlagKind::TooDense]
        );
        assert_eq!(result.clarity_score, 80.0);
    }

    #[test]
    fn test_unrecognizable_when_three_flags_fire() {
        let mut body = String::new();
        for i in 0..9 {
            body.push_str(&format!(
                r#"<rect x="{}" y="4" width="2" height="2" stroke-width="1"/>"#,
                2 + 2 * i
            ));
        }
        let result = validate_at_size(&extract(&format!("<svg>{body}</svg>")), 16);
        assert_eq!(result.flags.len(), 3);
        assert_eq!(result.clarity_score, 60.0);
        assert!(!result.is_recognizable);
        let report = preview_report(&extract(&format!("<svg>{body}</svg>")), &[16, 48]);
        assert_eq!(report.failed_sizes, vec![16]);
        assert_eq!(report.passed_sizes, vec![48]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(validate_at_sizes(&[], &PREVIEW_SIZES)
            .iter()
            .all(|r| r.clarity_score == 100.0));
        let report = preview_report(&extract(VALID_RECT), &[]);
        assert!(report.results.is_empty());
        assert_eq!(report.overall_score, 0.0);
    }

    #[test]
    fn test_command_ceiling_table() {
        assert_eq!(command_ceiling(16), 15);
        assert_eq!(command_ceiling(20), 25);
        assert_eq!(command_ceiling(32), 35);
        assert_eq!(command_ceiling(48), 50);
    }
}
