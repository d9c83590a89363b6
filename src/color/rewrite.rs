//! SVG recoloring.
//!
//! Two strategies produce a new [`Document`] from the source:
//!
//! - [`recolor`]: rewrites `fill`/`stroke` on every visual element
//! - [`apply_filter`]: wraps the content in a `feColorMatrix` filter group
//!
//! Neither touches `opacity`, `display` or `visibility`.

use super::{Color, ColorMatrix, ColorTag, Rgb};
use crate::svg::document::style_declarations;
use crate::svg::{Document, Element, Node};

/// Subtrees left alone by the rewriter: paint servers, masks and
/// descriptive content.
const SKIPPED: &[&str] = &[
    "linearGradient",
    "radialGradient",
    "pattern",
    "mask",
    "clipPath",
    "filter",
    "stop",
    "title",
    "desc",
    "metadata",
];

/// Style declarations that survive removal of an inline `style`.
const KEPT_DECLARATIONS: &[&str] = &["display", "visibility", "opacity"];

/// Elements that draw with the default black fill when none is inherited.
const DRAWABLES: &[&str] = &[
    "path", "rect", "circle", "ellipse", "polygon", "polyline", "text",
];

/// Gradient `href` chains are followed at most this deep.
const MAX_HREF_DEPTH: usize = 8;

/// Recolor a document by rewriting paint attributes.
///
/// `Original` and unrecognized modes return the input unchanged.
pub fn recolor(doc: &Document, tag: &ColorTag) -> Document {
    if let Some(target) = tag.flat_target() {
        return doc.with_root(flat_root(&doc.root, target));
    }
    if matches!(tag, ColorTag::Inverted) {
        let root = invert_children(doc, &doc.root, root_fill_inherited(&doc.root));
        return doc.with_root(root);
    }
    doc.clone()
}

/// Recolor a document by injecting a color-matrix filter.
///
/// The `<filter>` goes into the first `<defs>` (created as the first child
/// when absent) and every other child of the root is wrapped in one
/// `<g filter="url(#id)">`.
pub fn apply_filter(doc: &Document, tag: &ColorTag) -> Document {
    let Some(matrix) = ColorMatrix::for_tag(tag) else {
        return doc.clone();
    };
    let id = filter_id(tag);
    let filter = matrix.filter_element(&id);

    let mut defs: Vec<Node> = Vec::new();
    let mut wrapped = Element::new("g").with_attr("filter", format!("url(#{id})"));
    for node in &doc.root.children {
        match node {
            Node::Element(el) if el.local_name() == "defs" => defs.push(node.clone()),
            other => wrapped.children.push(other.clone()),
        }
    }

    match defs.first_mut() {
        Some(Node::Element(first)) => first.children.push(Node::Element(filter)),
        _ => defs.insert(0, Node::Element(Element::new("defs").with_child(filter))),
    }

    let mut root = doc.root.clone();
    root.children = defs;
    root.children.push(Node::Element(wrapped));
    doc.with_root(root)
}

/// Filter id for a mode: `brandkit-recolor-<label>`, lowercase.
pub fn filter_id(tag: &ColorTag) -> String {
    format!("brandkit-recolor-{}", tag.label().to_ascii_lowercase())
}

/// Solid approximation of a paint value.
///
/// Plain colors parse directly. A `url(#id)` reference to a gradient
/// resolves through its stops: one stop gives that stop, two give the
/// average of first and last, three or more give the middle stop.
/// Patterns and dangling references are unresolvable.
pub fn solid_paint(doc: &Document, value: &str) -> Option<Rgb> {
    match paint_reference(value) {
        Some(id) => gradient_color(doc, id, 0),
        None => Color::parse(value).map(|c| c.rgb),
    }
}

/// The id inside `url(#id)`, tolerating quotes and a fallback color.
pub fn paint_reference(value: &str) -> Option<&str> {
    let inner = value.trim().strip_prefix("url(")?;
    let inner = &inner[..inner.find(')')?];
    inner
        .trim()
        .trim_matches(['"', '\''])
        .strip_prefix('#')
}

fn gradient_color(doc: &Document, id: &str, depth: usize) -> Option<Rgb> {
    let gradient = doc.find_by_id(id)?;
    if !matches!(gradient.local_name(), "linearGradient" | "radialGradient") {
        return None;
    }

    let stops: Vec<Rgb> = gradient
        .child_elements()
        .filter(|el| el.local_name() == "stop")
        .map(|stop| {
            stop.property("stop-color")
                .and_then(Color::parse)
                .map_or(Rgb::BLACK, |c| c.rgb)
        })
        .collect();

    match stops.as_slice() {
        [] => {
            // Stops may live on a referenced template gradient.
            let href = gradient.attr("href").or_else(|| gradient.attr("xlink:href"))?;
            (depth < MAX_HREF_DEPTH)
                .then(|| gradient_color(doc, href.strip_prefix('#')?, depth + 1))
                .flatten()
        }
        [only] => Some(*only),
        [first, last] => Some(first.average(*last)),
        many => Some(many[many.len() / 2]),
    }
}

/// Rebuild `el` with `f` applied to every element below it (not to `el`).
fn map_children(el: &Element, f: &mut impl FnMut(&Element) -> Element) -> Element {
    let mut out = Element {
        name: el.name.clone(),
        attrs: el.attrs.clone(),
        children: Vec::with_capacity(el.children.len()),
    };
    for child in &el.children {
        out.children.push(match child {
            Node::Element(child) => Node::Element(f(child)),
            other => other.clone(),
        });
    }
    out
}

/// Whether fill and stroke resolve to something visible at a point in the
/// tree. SVG starts out with a black fill and no stroke.
#[derive(Debug, Clone, Copy)]
struct Painted {
    fill: bool,
    stroke: bool,
}

impl Painted {
    const INITIAL: Self = Self {
        fill: true,
        stroke: false,
    };

    fn resolve(self, el: &Element) -> Self {
        Self {
            fill: resolve_paint(el.property("fill"), self.fill),
            stroke: resolve_paint(el.property("stroke"), self.stroke),
        }
    }
}

fn resolve_paint(value: Option<&str>, inherited: bool) -> bool {
    match value {
        None | Some("inherit") => inherited,
        Some(v) => !is_transparent(v),
    }
}

/// The root keeps its own paint; an inherited `currentColor` is pointed at
/// the target through `color`.
fn flat_root(root: &Element, target: Rgb) -> Element {
    let painted = Painted::INITIAL.resolve(root);
    let mut out = map_children(root, &mut |el| flat_element(el, target, painted));
    let current = ["fill", "stroke"]
        .iter()
        .filter_map(|p| root.property(p))
        .any(|v| v.eq_ignore_ascii_case("currentColor"));
    if current {
        out.set_attr("color", target.to_hex());
    }
    out
}

fn flat_element(el: &Element, target: Rgb, inherited: Painted) -> Element {
    let name = el.local_name();
    if SKIPPED.contains(&name) {
        return el.clone();
    }
    if name == "style" {
        return Element {
            name: el.name.clone(),
            attrs: el.attrs.clone(),
            children: Vec::new(),
        };
    }

    let painted = inherited.resolve(el);
    let mut out = map_children(el, &mut |child| flat_element(child, target, painted));
    if name == "defs" {
        return out;
    }

    let hex = target.to_hex();
    let fill = el.property("fill").map(str::to_string);
    let stroke = el.property("stroke").map(str::to_string);

    strip_style(&mut out);
    out.remove_attr("fill-opacity");
    out.remove_attr("stroke-opacity");

    // none/transparent stay as written, inherited or not
    for (property, own, visible) in [
        ("fill", fill, painted.fill),
        ("stroke", stroke, painted.stroke),
    ] {
        match own.as_deref() {
            Some(v) if is_transparent(v) => out.set_attr(property, v),
            _ if visible => out.set_attr(property, hex.as_str()),
            _ => {}
        }
    }
    out
}

/// Remove the inline `style`, keeping visibility-related declarations.
fn strip_style(el: &mut Element) {
    let Some(style) = el.attr("style") else {
        return;
    };
    let kept: Vec<String> = style_declarations(style)
        .filter(|(k, _)| KEPT_DECLARATIONS.contains(k))
        .map(|(k, v)| format!("{k}:{v}"))
        .collect();
    if kept.is_empty() {
        el.remove_attr("style");
    } else {
        el.set_attr("style", kept.join(";"));
    }
}

fn is_transparent(value: &str) -> bool {
    matches!(value, "none" | "transparent")
}

/// Whether the root itself sets a fill for its descendants.
fn root_fill_inherited(root: &Element) -> bool {
    root.property("fill").is_some()
}

fn invert_children(doc: &Document, el: &Element, fill_inherited: bool) -> Element {
    let mut out = Element {
        name: el.name.clone(),
        attrs: el.attrs.clone(),
        children: Vec::with_capacity(el.children.len()),
    };
    for child in &el.children {
        out.children.push(match child {
            Node::Element(child) => Node::Element(invert_element(doc, child, fill_inherited)),
            other => other.clone(),
        });
    }
    out
}

fn invert_element(doc: &Document, el: &Element, fill_inherited: bool) -> Element {
    let name = el.local_name();
    if SKIPPED.contains(&name) || name == "style" {
        return el.clone();
    }

    let own_fill = el.property("fill").is_some();
    let mut out = invert_children(doc, el, fill_inherited || own_fill);
    if name == "defs" {
        return out;
    }

    for property in ["fill", "stroke"] {
        let Some(value) = el.property(property) else {
            continue;
        };
        if let Some(inverted) = invert_paint(doc, value) {
            replace_property(&mut out, property, &inverted);
        }
    }

    if !own_fill && !fill_inherited && DRAWABLES.contains(&name) {
        out.set_attr("fill", Rgb::WHITE.to_hex());
    }
    out
}

/// Inverted form of a paint value; `None` leaves the value as written.
fn invert_paint(doc: &Document, value: &str) -> Option<String> {
    if is_transparent(value) || matches!(value, "inherit" | "currentColor" | "currentcolor") {
        return None;
    }
    if paint_reference(value).is_some() {
        let solid = solid_paint(doc, value).unwrap_or(Rgb::BLACK);
        return Some(solid.invert().to_hex());
    }
    let color = Color::parse(value)?;
    Some(
        Color {
            rgb: color.rgb.invert(),
            alpha: color.alpha,
        }
        .to_css(),
    )
}

/// Replace a property where it is declared: inside `style` when present
/// there, otherwise as an attribute.
fn replace_property(el: &mut Element, name: &str, value: &str) {
    if el.style_value(name).is_some() {
        if let Some(style) = el.attr("style") {
            let rebuilt: Vec<String> = style_declarations(style)
                .map(|(k, v)| {
                    if k == name {
                        format!("{k}:{value}")
                    } else {
                        format!("{k}:{v}")
                    }
                })
                .collect();
            el.set_attr("style", rebuilt.join(";"));
        }
        return;
    }
    el.set_attr(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::parse_svg;

    const RED_RECT: &str =
        r##"<svg viewBox="0 0 100 100"><rect x="0" y="0" width="100" height="100" fill="#ff0000"/></svg>"##;

    fn recolored(src: &str, tag: ColorTag) -> String {
        recolor(&parse_svg(src).unwrap(), &tag).to_svg_string()
    }

    #[test]
    fn test_original_is_unchanged() {
        let doc = parse_svg(RED_RECT).unwrap();
        assert_eq!(recolor(&doc, &ColorTag::Original), doc);
        assert_eq!(recolor(&doc, &ColorTag::Unrecognized("sepia".into())), doc);
    }

    #[test]
    fn test_black_rewrites_fill() {
        let out = recolored(RED_RECT, ColorTag::Black);
        assert!(out.contains(r##"fill="#000000""##));
        assert!(!out.contains("ff0000"));
    }

    #[test]
    fn test_inverted_rewrites_fill() {
        let out = recolored(RED_RECT, ColorTag::Inverted);
        assert!(out.contains(r##"fill="#00ffff""##));
    }

    #[test]
    fn test_flat_keeps_none_and_visibility() {
        let out = recolored(
            r##"<svg><path d="M0 0" style="fill:none;stroke:#123456;display:none;stroke-opacity:0.5"/></svg>"##,
            ColorTag::White,
        );
        assert!(out.contains(r#"fill="none""#));
        assert!(out.contains(r##"stroke="#ffffff""##));
        assert!(out.contains(r#"style="display:none""#));
        assert!(!out.contains("stroke-opacity"));
    }

    #[test]
    fn test_flat_only_sets_existing_stroke() {
        let out = recolored(
            r#"<svg><rect width="1" height="1" fill-opacity="0.3"/></svg>"#,
            ColorTag::Grayscale,
        );
        assert!(out.contains(r##"fill="#808080""##));
        assert!(!out.contains("stroke="));
        assert!(!out.contains("fill-opacity"));
    }

    #[test]
    fn test_flat_redirects_gradient_and_empties_style_block() {
        let out = recolored(
            r##"<svg><style>.a{fill:red}</style><defs><linearGradient id="g"><stop stop-color="#ff0000"/></linearGradient></defs><rect class="a" fill="url(#g)" width="1" height="1"/></svg>"##,
            ColorTag::Custom(Rgb::new(0x12, 0x34, 0x56)),
        );
        assert!(out.contains(r##"<rect class="a" fill="#123456""##));
        assert!(out.contains("<style/>"));
        // stops are left alone
        assert!(out.contains(r##"stop-color="#ff0000""##));
    }

    #[test]
    fn test_flat_keeps_inherited_none_fill() {
        let src = r##"<svg fill="none" stroke="currentColor"><g><path d="M0 0L10 10" stroke="#ff0000"/></g></svg>"##;
        let out = recolored(src, ColorTag::Black);
        assert!(out.starts_with(r##"<svg fill="none" stroke="currentColor" color="#000000">"##));
        assert!(out.contains(r##"<g stroke="#000000"><path d="M0 0L10 10" stroke="#000000"/></g>"##));
        assert!(!out.contains(r##"fill="#000000""##));

        let doc = recolor(&parse_svg(src).unwrap(), &ColorTag::Black);
        let shapes = crate::svg::geometry::collect(&doc);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].fill, None);
    }

    #[test]
    fn test_flat_fill_resumes_below_none() {
        let out = recolored(
            r##"<svg fill="none"><g fill="red"><rect width="1" height="1"/></g><circle r="1" fill="inherit"/></svg>"##,
            ColorTag::White,
        );
        assert!(out.contains(r##"<g fill="#ffffff"><rect width="1" height="1" fill="#ffffff"/></g>"##));
        assert!(out.contains(r#"<circle r="1" fill="inherit"/>"#));
    }

    #[test]
    fn test_flat_inherited_stroke_is_rewritten() {
        let out = recolored(
            r##"<svg stroke="#ff0000"><line x2="1"/></svg>"##,
            ColorTag::Custom(Rgb::new(0, 0, 0xff)),
        );
        assert!(out.starts_with(r##"<svg stroke="#ff0000">"##));
        assert!(out.contains(r##"<line x2="1" fill="#0000ff" stroke="#0000ff"/>"##));
    }

    #[test]
    fn test_root_is_not_rewritten() {
        let out = recolored(r#"<svg fill="red"><g/></svg>"#, ColorTag::Black);
        assert!(out.starts_with(r#"<svg fill="red">"#));
    }

    #[test]
    fn test_inverted_style_and_gradient() {
        let out = recolored(
            r##"<svg><defs><linearGradient id="g"><stop stop-color="#000000"/><stop stop-color="#ffffff"/></linearGradient></defs>
                <rect style="fill:#ffffff;opacity:0.5" width="1" height="1"/>
                <circle r="1" fill="url(#g)"/></svg>"##,
            ColorTag::Inverted,
        );
        assert!(out.contains(r##"style="fill:#000000;opacity:0.5""##));
        // average of black and white is #808080, inverted #7f7f7f
        assert!(out.contains(r##"<circle r="1" fill="#7f7f7f"/>"##));
    }

    #[test]
    fn test_inverted_default_fill_becomes_white() {
        let out = recolored(
            r##"<svg><rect width="1" height="1"/><g fill="#00ff00"><rect width="1" height="1"/></g></svg>"##,
            ColorTag::Inverted,
        );
        assert!(out.contains(r##"<rect width="1" height="1" fill="#ffffff"/>"##));
        assert!(out.contains(r##"<g fill="#ff00ff"><rect width="1" height="1"/></g>"##));
    }

    #[test]
    fn test_solid_paint_rules() {
        let doc = parse_svg(
            r##"<svg><defs>
                <linearGradient id="one"><stop stop-color="#112233"/></linearGradient>
                <linearGradient id="three"><stop stop-color="red"/><stop style="stop-color:#00ff00"/><stop stop-color="blue"/></linearGradient>
                <radialGradient id="ref" href="#one"/>
                <pattern id="p"/>
            </defs></svg>"##,
        )
        .unwrap();
        assert_eq!(solid_paint(&doc, "url(#one)"), Some(Rgb::new(0x11, 0x22, 0x33)));
        assert_eq!(solid_paint(&doc, "url(#three)"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(solid_paint(&doc, "url('#ref')"), Some(Rgb::new(0x11, 0x22, 0x33)));
        assert_eq!(solid_paint(&doc, "url(#p)"), None);
        assert_eq!(solid_paint(&doc, "url(#missing)"), None);
        assert_eq!(solid_paint(&doc, "#abc"), Some(Rgb::new(0xaa, 0xbb, 0xcc)));
    }

    #[test]
    fn test_apply_filter_creates_defs_and_wraps() {
        let doc = parse_svg(RED_RECT).unwrap();
        let out = apply_filter(&doc, &ColorTag::Black);
        let children: Vec<_> = out.root.child_elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "defs");
        assert_eq!(
            children[0].child_elements().next().unwrap().attr("id"),
            Some("brandkit-recolor-black")
        );
        assert_eq!(children[1].attr("filter"), Some("url(#brandkit-recolor-black)"));
        assert_eq!(children[1].child_elements().next().unwrap().name, "rect");
        // the source paint is untouched
        assert!(out.to_svg_string().contains("#ff0000"));
    }

    #[test]
    fn test_apply_filter_reuses_existing_defs() {
        let doc = parse_svg(r#"<svg><rect width="1" height="1"/><defs><clipPath id="c"/></defs></svg>"#)
            .unwrap();
        let out = apply_filter(&doc, &ColorTag::Custom(Rgb::new(255, 136, 0)));
        let defs = out.root.child_elements().next().unwrap();
        assert_eq!(defs.children.len(), 2);
        assert!(out.find_by_id("brandkit-recolor-custom-ff8800").is_some());
        assert_eq!(apply_filter(&doc, &ColorTag::Original), doc);
    }
}
