//! Approximate analysis of path data strings.
//!
//! Bounds come from a flat scan of every numeric token, alternating x and y.
//! Curves, arcs and single-axis commands (`H`, `V`) are therefore only
//! approximated; downstream rules are calibrated against this estimate.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Bounds;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap());

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[MLHVCSQTAmlhvcsqta]").unwrap());

/// Command tallies for one path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandCounts {
    /// All drawing commands (`M L H V C S Q T A`, either case).
    pub total: usize,
    /// Curve commands (`C S Q`).
    pub curves: usize,
    /// Straight commands (`M L H`).
    pub straight: usize,
}

impl CommandCounts {
    pub fn add(&mut self, other: CommandCounts) {
        self.total += other.total;
        self.curves += other.curves;
        self.straight += other.straight;
    }
}

/// Every numeric token in document order.
pub fn numeric_tokens(path_data: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(path_data)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// Bounding box estimated by min/max over even (x) and odd (y) tokens.
pub fn estimate_bounds(path_data: &str) -> Bounds {
    let tokens = numeric_tokens(path_data);
    if tokens.is_empty() {
        return Bounds::default();
    }
    let xs = tokens.iter().step_by(2).copied();
    let ys = tokens.iter().skip(1).step_by(2).copied();
    let (min_x, max_x) = min_max(xs);
    let (min_y, max_y) = match min_max(ys) {
        (lo, hi) if lo.is_finite() => (lo, hi),
        _ => (0.0, 0.0),
    };
    Bounds::from_extents(min_x, min_y, max_x, max_y)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

pub fn count_commands(path_data: &str) -> CommandCounts {
    let mut counts = CommandCounts::default();
    for m in COMMAND_RE.find_iter(path_data) {
        counts.total += 1;
        match m.as_str().to_ascii_uppercase().as_str() {
            "C" | "S" | "Q" => counts.curves += 1,
            "M" | "L" | "H" => counts.straight += 1,
            _ => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_tokens_handle_compact_syntax() {
        let tokens = numeric_tokens("M4-2L1.5.5e1z");
        assert_eq!(tokens, vec![4.0, -2.0, 1.5, 5.0]);
    }

    #[test]
    fn test_estimate_bounds_alternates_axes() {
        let bounds = estimate_bounds("M4 6 L20 6 L20 18 Z");
        assert_eq!(bounds, Bounds::new(4.0, 6.0, 16.0, 12.0));
    }

    #[test]
    fn test_estimate_bounds_single_token() {
        let bounds = estimate_bounds("M7");
        assert_eq!(bounds, Bounds::new(7.0, 0.0, 0.0, 0.0));
        assert_eq!(estimate_bounds(""), Bounds::default());
    }

    #[test]
    fn test_count_commands() {
        let counts = count_commands("M2 2 L4 4 h2 v2 C1 1 2 2 3 3 s1 1 2 2 Q0 0 1 1 A1 1 0 0 1 5 5 Z");
        assert_eq!(counts.total, 8);
        assert_eq!(counts.curves, 3);
        assert_eq!(counts.straight, 3);
    }
}
