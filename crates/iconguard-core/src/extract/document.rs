//! Tag and attribute scanning for the constrained vector markup.
//!
//! This is a line-agnostic regex scan, not an XML parser: it recognises only
//! `svg`, `g`, `rect`, `circle`, `line` and `path` tags with quoted attribute
//! values, and silently skips anything else.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::models::ViewBox;

// ---------------------------------------------------------------------------
// Compiled regex patterns (LazyLock for one-time init)
// ---------------------------------------------------------------------------

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*(svg|g|rect|circle|line|path)\b([^>]*?)(/)?\s*>").unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static SVG_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\s*svg\b").unwrap());

static VIEWBOX_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").unwrap());

// ---------------------------------------------------------------------------
// Scanned element
// ---------------------------------------------------------------------------

/// One opening, closing or self-closing tag.
#[derive(Clone, Debug)]
pub struct Element {
    pub tag: String,
    pub closing: bool,
    pub self_closing: bool,
    pub attributes: IndexMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// True if the document declares an `<svg>` root at all.
pub fn has_svg_root(document: &str) -> bool {
    SVG_ROOT_RE.is_match(document)
}

/// Scan every supported tag in document order.
pub fn scan_elements(document: &str) -> Vec<Element> {
    TAG_RE
        .captures_iter(document)
        .map(|caps| Element {
            tag: caps[2].to_string(),
            closing: caps.get(1).is_some(),
            self_closing: caps.get(4).is_some(),
            attributes: caps
                .get(3)
                .map(|m| parse_attributes(m.as_str()))
                .unwrap_or_default(),
        })
        .collect()
}

/// Parse quoted `name="value"` pairs; the first occurrence of a name wins.
pub fn parse_attributes(raw: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    for caps in ATTR_RE.captures_iter(raw) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        attributes.entry(caps[1].to_string()).or_insert(value);
    }
    attributes
}

/// Parse a numeric attribute value, tolerating a trailing `px` unit.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The `viewBox` declared on the first `<svg>` element, if well-formed.
pub fn parse_viewbox(document: &str) -> Option<ViewBox> {
    let svg = scan_elements(document)
        .into_iter()
        .find(|el| el.tag == "svg" && !el.closing)?;
    let raw = svg.attr("viewBox")?;
    let parts: Vec<f64> = VIEWBOX_SPLIT_RE
        .split(raw.trim())
        .filter(|s| !s.is_empty())
        .map(parse_number)
        .collect::<Option<Vec<f64>>>()?;
    match parts.as_slice() {
        [min_x, min_y, width, height] => Some(ViewBox {
            min_x: *min_x,
            min_y: *min_y,
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}
