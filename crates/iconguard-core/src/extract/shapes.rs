//! Shape extraction: markup in, typed geometric primitives out.
//!
//! Extraction never fails. A document without an `<svg>` root or without any
//! supported drawable element yields an empty vector, which the validators
//! report as a missing primary element.

use indexmap::IndexMap;
use tracing::debug;

use crate::extract::document::{has_svg_root, parse_number, scan_elements};
use crate::extract::path_data::estimate_bounds;
use crate::models::{Bounds, DecorationKind, Role, Shape, ShapeKind, Stroke};
use crate::profile::CANONICAL_STROKE_WIDTH;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_STROKE_COLOR: &str = "#000000";
pub const DEFAULT_FILL: &str = "none";

/// Attributes a `<g>` passes down to its children.
const INHERITED_ATTRIBUTES: &[&str] = &[
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "fill",
    "class",
    "data-role",
    "data-decoration",
];

/// Attributes that position geometry and must sit on the pixel grid.
pub const COORDINATE_ATTRIBUTES: &[&str] = &[
    "x", "y", "width", "height", "cx", "cy", "r", "x1", "y1", "x2", "y2", "rx", "ry",
];

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Decompose a vector document into shapes, in document order.
pub fn extract(document: &str) -> Vec<Shape> {
    if !has_svg_root(document) {
        debug!("Extraction degraded: no <svg> root in {} bytes", document.len());
        return vec![];
    }

    let mut group_stack: Vec<IndexMap<String, String>> = Vec::new();
    let mut shapes = Vec::new();

    for element in scan_elements(document) {
        if element.tag == "g" {
            if element.closing {
                group_stack.pop();
            } else if !element.self_closing {
                group_stack.push(inheritable(&element.attributes));
            }
            continue;
        }
        if element.closing {
            continue;
        }
        let Some(kind) = ShapeKind::from_tag(&element.tag) else {
            continue;
        };
        let attrs = resolve_attributes(&group_stack, &element.attributes);
        shapes.push(build_shape(shapes.len(), kind, &attrs));
    }

    if shapes.is_empty() {
        debug!("Extraction degraded: no drawable elements found");
    }
    shapes
}

fn inheritable(attrs: &IndexMap<String, String>) -> IndexMap<String, String> {
    attrs
        .iter()
        .filter(|(name, _)| INHERITED_ATTRIBUTES.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Own attributes first, then the nearest enclosing group's, outwards.
fn resolve_attributes(
    group_stack: &[IndexMap<String, String>],
    own: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut resolved = own.clone();
    for group in group_stack.iter().rev() {
        for (name, value) in group {
            resolved
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
    resolved
}

fn number(attrs: &IndexMap<String, String>, name: &str) -> f64 {
    attrs.get(name).and_then(|v| parse_number(v)).unwrap_or(0.0)
}

fn build_shape(index: usize, kind: ShapeKind, attrs: &IndexMap<String, String>) -> Shape {
    let coordinates: IndexMap<String, f64> = attrs
        .iter()
        .filter(|(name, _)| COORDINATE_ATTRIBUTES.contains(&name.as_str()))
        .filter_map(|(name, value)| parse_number(value).map(|v| (name.clone(), v)))
        .collect();

    let path_data = match kind {
        ShapeKind::Path => Some(attrs.get("d").cloned().unwrap_or_default()),
        _ => None,
    };

    let bounds = match kind {
        ShapeKind::Rectangle => Bounds::new(
            number(attrs, "x"),
            number(attrs, "y"),
            number(attrs, "width"),
            number(attrs, "height"),
        ),
        ShapeKind::Circle => {
            let r = number(attrs, "r").max(0.0);
            Bounds::new(number(attrs, "cx") - r, number(attrs, "cy") - r, 2.0 * r, 2.0 * r)
        }
        ShapeKind::Line => {
            let (x1, y1) = (number(attrs, "x1"), number(attrs, "y1"));
            let (x2, y2) = (number(attrs, "x2"), number(attrs, "y2"));
            Bounds::from_extents(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
        }
        ShapeKind::Path => estimate_bounds(path_data.as_deref().unwrap_or("")),
    };

    let angle = match kind {
        ShapeKind::Line => Some(line_angle(
            number(attrs, "x2") - number(attrs, "x1"),
            number(attrs, "y2") - number(attrs, "y1"),
        )),
        _ => None,
    };

    let corner_radius = match kind {
        ShapeKind::Rectangle => attrs
            .get("rx")
            .or_else(|| attrs.get("ry"))
            .and_then(|v| parse_number(v)),
        _ => None,
    };

    let (role, decoration_kind) = infer_role(attrs);

    Shape {
        index,
        id: attrs.get("id").cloned(),
        kind,
        bounds,
        stroke: parse_stroke(attrs),
        fill: attrs
            .get("fill")
            .map(|f| f.trim().to_string())
            .unwrap_or_else(|| DEFAULT_FILL.to_string()),
        corner_radius,
        angle,
        role,
        decoration_kind,
        coordinates,
        path_data,
    }
}

fn parse_stroke(attrs: &IndexMap<String, String>) -> Option<Stroke> {
    let color = attrs.get("stroke").map(|c| c.trim());
    if color.is_some_and(|c| c.eq_ignore_ascii_case("none")) {
        return None;
    }
    Some(Stroke {
        width: attrs
            .get("stroke-width")
            .and_then(|v| parse_number(v))
            .unwrap_or(CANONICAL_STROKE_WIDTH),
        color: color.unwrap_or(DEFAULT_STROKE_COLOR).to_string(),
        linecap: attrs.get("stroke-linecap").map(|v| v.trim().to_string()),
    })
}

/// Angle of a segment in whole degrees, normalized to `[0, 180)`.
pub fn line_angle(dx: f64, dy: f64) -> f64 {
    let degrees = dy.atan2(dx).to_degrees().round().rem_euclid(180.0);
    // rem_euclid keeps the sign of a negative zero
    if degrees == 0.0 {
        0.0
    } else {
        degrees
    }
}

/// Read the authoring hint from `data-role`, `data-decoration` and `class`.
fn infer_role(attrs: &IndexMap<String, String>) -> (Role, Option<DecorationKind>) {
    let hints: Vec<String> = ["data-role", "data-decoration", "class"]
        .iter()
        .filter_map(|name| attrs.get(*name))
        .flat_map(|value| value.split_whitespace())
        .map(|token| token.to_ascii_lowercase())
        .collect();
    let has = |names: &[&str]| hints.iter().any(|h| names.contains(&h.as_str()));

    if has(&["sparkle", "sparkles"]) {
        return (Role::Decoration, Some(DecorationKind::Sparkle));
    }
    if has(&["dot", "dots"]) {
        return (Role::Decoration, Some(DecorationKind::Dot));
    }
    if has(&["decoration", "decorative", "decor"]) {
        return (Role::Decoration, None);
    }
    if has(&["supporting", "secondary", "support"]) {
        return (Role::Supporting, None);
    }
    (Role::Primary, None)
}
