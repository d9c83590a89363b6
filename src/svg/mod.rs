//! SVG document model and geometry.
//!
//! # Modules
//!
//! - [`document`]: immutable element tree and serializer
//! - [`parse`]: quick-xml based parser
//! - [`path`]: path-data parser producing absolute segments
//! - [`transform`]: `transform` attribute parser and affine matrix
//! - [`geometry`]: normalized drawables for the vector exporters
//!
//! # Architecture
//!
//! ```text
//! SVG text
//!    │
//!    ▼
//! ┌───────┐      ┌──────────┐      ┌─────────────────┐
//! │ parse │ ───► │ Document │ ───► │ geometry::collect│ ──► EPS / PDF
//! └───────┘      └────┬─────┘      └─────────────────┘
//!                     │
//!                     ▼
//!               color::rewrite ──► new Document
//! ```

pub mod document;
pub mod geometry;
mod parse;
pub mod path;
pub mod transform;

pub use document::{Document, Element, Node};
pub use parse::parse_svg;

use thiserror::Error;

/// Page size used when neither `viewBox` nor `width`/`height` is usable.
pub const DEFAULT_PAGE_SIZE: f64 = 300.0;

/// Errors produced while reading SVG markup.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("document is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unbalanced element tags")]
    Unbalanced,

    #[error("more than one root element")]
    MultipleRoots,

    #[error("document has no root element")]
    Empty,

    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),
}

/// Page geometry of a document in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// Resolve page geometry: `viewBox` first, then `width`/`height`,
    /// then [`DEFAULT_PAGE_SIZE`] on both axes.
    pub fn of(doc: &Document) -> Self {
        if let Some(vb) = doc.root.attr("viewBox").and_then(parse_view_box) {
            return vb;
        }

        let width = doc.root.attr("width").and_then(parse_length);
        let height = doc.root.attr("height").and_then(parse_length);
        match (width, height) {
            (Some(width), Some(height)) => Self::sized(width, height),
            (Some(width), None) => Self::sized(width, DEFAULT_PAGE_SIZE),
            (None, Some(height)) => Self::sized(DEFAULT_PAGE_SIZE, height),
            (None, None) => Self::sized(DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE),
        }
    }

    pub const fn sized(width: f64, height: f64) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width,
            height,
        }
    }
}

/// Parse `viewBox="min-x min-y width height"`; non-positive sizes are rejected.
pub fn parse_view_box(value: &str) -> Option<PageBox> {
    let nums = path::parse_number_list(value);
    match nums.as_slice() {
        &[min_x, min_y, width, height] if width > 0.0 && height > 0.0 => Some(PageBox {
            min_x,
            min_y,
            width,
            height,
        }),
        _ => None,
    }
}

/// Parse a length in user units. Accepts bare numbers, `px` and `pt`;
/// percentages and other units count as absent.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, scale) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 96.0 / 72.0)
    } else {
        (value, 1.0)
    };
    let parsed: f64 = number.trim().parse().ok()?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed * scale)
}

/// Parse a number attribute, defaulting to zero.
pub fn number_attr(el: &Element, name: &str) -> f64 {
    el.attr(name)
        .and_then(|v| {
            let v = v.trim();
            v.strip_suffix("px").unwrap_or(v).trim().parse().ok()
        })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_box_prefers_view_box() {
        let doc = parse_svg(r#"<svg viewBox="0 0 120 80" width="10" height="10"/>"#).unwrap();
        assert_eq!(PageBox::of(&doc), PageBox::sized(120.0, 80.0));
    }

    #[test]
    fn test_page_box_from_width_height() {
        let doc = parse_svg(r#"<svg width="64px" height="32"/>"#).unwrap();
        assert_eq!(PageBox::of(&doc), PageBox::sized(64.0, 32.0));
    }

    #[test]
    fn test_page_box_default() {
        let doc = parse_svg(r#"<svg width="100%"/>"#).unwrap();
        assert_eq!(PageBox::of(&doc), PageBox::sized(300.0, 300.0));
    }

    #[test]
    fn test_view_box_with_commas_and_origin() {
        let vb = parse_view_box("-5,-5 110,110").unwrap();
        assert_eq!(vb.min_x, -5.0);
        assert_eq!(vb.width, 110.0);
        assert!(parse_view_box("0 0 0 10").is_none());
        assert!(parse_view_box("0 0 10").is_none());
    }

    #[test]
    fn test_parse_length_units() {
        assert_eq!(parse_length("12"), Some(12.0));
        assert_eq!(parse_length("12px"), Some(12.0));
        assert_eq!(parse_length("72pt"), Some(96.0));
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_length("-3"), None);
    }
}
