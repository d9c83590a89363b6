//! Normalized drawables for the vector exporters.
//!
//! [`collect`] walks the rendered part of a document and produces one
//! [`GeometryElement`] per visible `path`, `rect`, `circle`, `ellipse`,
//! `line`, `polygon` and `polyline`, with paint and transforms already
//! resolved against the ancestor chain.

use super::document::{Document, Element};
use super::number_attr;
use super::path::{Point, Segment, parse_path, parse_points};
use super::transform::{Matrix, parse_transform};
use crate::debug;

/// Cubic Bézier circle approximation constant.
pub const KAPPA: f64 = 0.552_284_749_8;

/// Elements whose content is never drawn directly.
const NON_RENDERED: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "pattern",
    "marker",
    "symbol",
    "linearGradient",
    "radialGradient",
    "filter",
    "title",
    "desc",
    "metadata",
    "style",
    "script",
];

/// Nesting limit for `<use>` references.
const MAX_USE_DEPTH: usize = 8;

/// Upper bound on drawables collected from one document, so nested
/// `<use>` fan-out cannot grow without limit.
const MAX_ELEMENTS: usize = 100_000;

/// Drawable element kinds, in the order the EPS exporter emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShapeKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ShapeKind {
    pub const EPS_ORDER: [ShapeKind; 7] = [
        ShapeKind::Path,
        ShapeKind::Rect,
        ShapeKind::Circle,
        ShapeKind::Ellipse,
        ShapeKind::Line,
        ShapeKind::Polyline,
        ShapeKind::Polygon,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Path(Vec<Segment>),
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Path(_) => ShapeKind::Path,
            Shape::Rect { .. } => ShapeKind::Rect,
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Ellipse { .. } => ShapeKind::Ellipse,
            Shape::Line { .. } => ShapeKind::Line,
            Shape::Polyline(_) => ShapeKind::Polyline,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Outline as absolute segments. Circles, ellipses and rounded
    /// corners become cubic Béziers.
    pub fn to_segments(&self) -> Vec<Segment> {
        match self {
            Shape::Path(segments) => segments.clone(),
            &Shape::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => rect_segments(x, y, width, height, rx, ry),
            &Shape::Circle { cx, cy, r } => ellipse_segments(cx, cy, r, r),
            &Shape::Ellipse { cx, cy, rx, ry } => ellipse_segments(cx, cy, rx, ry),
            &Shape::Line { x1, y1, x2, y2 } => vec![
                Segment::MoveTo(Point::new(x1, y1)),
                Segment::LineTo(Point::new(x2, y2)),
            ],
            Shape::Polyline(points) => polyline_segments(points, false),
            Shape::Polygon(points) => polyline_segments(points, true),
        }
    }

    /// Lines and polylines are open; filling them is a no-op for `line`.
    pub fn is_fillable(&self) -> bool {
        !matches!(self, Shape::Line { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// One drawable with its resolved presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryElement {
    pub shape: Shape,
    /// Fill paint as written (hex, name, `rgb()`, `url(#id)`); `None` when
    /// the resolved fill is `none`.
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    /// Element opacity multiplied through ancestor groups.
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub fill_rule: FillRule,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// The element's own `transform` attribute, if any.
    pub transform: Option<String>,
    /// Ancestor transforms composed with the element's own.
    pub matrix: Matrix,
}

impl GeometryElement {
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn has_fill(&self) -> bool {
        self.fill.is_some() && self.shape.is_fillable()
    }

    pub fn has_stroke(&self) -> bool {
        self.stroke.is_some() && self.stroke_width > 0.0
    }

    pub fn fill_alpha(&self) -> f64 {
        self.opacity * self.fill_opacity
    }

    pub fn stroke_alpha(&self) -> f64 {
        self.opacity * self.stroke_opacity
    }
}

/// Inherited presentation state while walking the tree.
#[derive(Debug, Clone)]
struct Inherited {
    fill: Option<String>,
    stroke: Option<String>,
    color: String,
    stroke_width: f64,
    fill_opacity: f64,
    stroke_opacity: f64,
    fill_rule: FillRule,
    line_cap: LineCap,
    line_join: LineJoin,
    opacity: f64,
    matrix: Matrix,
}

impl Default for Inherited {
    fn default() -> Self {
        Self {
            fill: Some("black".to_string()),
            stroke: None,
            color: "black".to_string(),
            stroke_width: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            opacity: 1.0,
            matrix: Matrix::IDENTITY,
        }
    }
}

impl Inherited {
    /// State for the children of `el`.
    fn child_of(&self, el: &Element) -> Self {
        let mut next = self.clone();
        if let Some(color) = el.property("color").filter(|v| *v != "inherit") {
            next.color = color.to_string();
        }
        if let Some(fill) = el.property("fill") {
            next.fill = paint(fill, &self.fill, &next.color);
        }
        if let Some(stroke) = el.property("stroke") {
            next.stroke = paint(stroke, &self.stroke, &next.color);
        }
        if let Some(w) = el.property("stroke-width").and_then(parse_number) {
            next.stroke_width = w.max(0.0);
        }
        if let Some(o) = el.property("fill-opacity").and_then(parse_opacity) {
            next.fill_opacity = o;
        }
        if let Some(o) = el.property("stroke-opacity").and_then(parse_opacity) {
            next.stroke_opacity = o;
        }
        match el.property("fill-rule") {
            Some("evenodd") => next.fill_rule = FillRule::EvenOdd,
            Some("nonzero") => next.fill_rule = FillRule::NonZero,
            _ => {}
        }
        match el.property("stroke-linecap") {
            Some("round") => next.line_cap = LineCap::Round,
            Some("square") => next.line_cap = LineCap::Square,
            Some("butt") => next.line_cap = LineCap::Butt,
            _ => {}
        }
        match el.property("stroke-linejoin") {
            Some("round") => next.line_join = LineJoin::Round,
            Some("bevel") => next.line_join = LineJoin::Bevel,
            Some("miter" | "miter-clip" | "arcs") => next.line_join = LineJoin::Miter,
            _ => {}
        }
        if let Some(o) = el.property("opacity").and_then(parse_opacity) {
            next.opacity *= o;
        }
        if let Some(m) = el.attr("transform").and_then(parse_transform) {
            next.matrix = self.matrix.then_inner(&m);
        }
        next
    }
}

fn paint(value: &str, inherited: &Option<String>, current_color: &str) -> Option<String> {
    match value {
        "none" | "transparent" => None,
        "inherit" => inherited.clone(),
        "currentColor" | "currentcolor" => Some(current_color.to_string()),
        other => Some(other.to_string()),
    }
}

/// Collect the drawables of a document in document order.
///
/// A `<use>` pointing at an element that is already being expanded (itself
/// or one of its ancestors) is skipped, as is anything past
/// `MAX_ELEMENTS` drawables.
pub fn collect(doc: &Document) -> Vec<GeometryElement> {
    let mut walker = Walker {
        doc,
        open: Vec::new(),
        out: Vec::new(),
    };
    if doc.root.is_hidden() {
        return walker.out;
    }
    // The root's own presentation attributes apply to everything below it.
    let state = Inherited::default().child_of(&doc.root);
    walker.open.push(&doc.root);
    for child in doc.root.child_elements() {
        walker.walk(child, &state, 0);
    }
    walker.out
}

/// Collect drawables grouped by kind in [`ShapeKind::EPS_ORDER`],
/// keeping document order within each kind.
pub fn collect_by_kind(doc: &Document) -> Vec<GeometryElement> {
    let mut elements = collect(doc);
    elements.sort_by_key(GeometryElement::kind);
    elements
}

struct Walker<'a> {
    doc: &'a Document,
    /// Elements on the current path, `<use>` targets included.
    open: Vec<&'a Element>,
    out: Vec<GeometryElement>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, el: &'a Element, parent: &Inherited, depth: usize) {
        let name = el.local_name();
        if el.is_hidden() || NON_RENDERED.contains(&name) || self.out.len() >= MAX_ELEMENTS {
            return;
        }

        let state = parent.child_of(el);
        self.open.push(el);

        match name {
            "g" | "a" | "svg" | "switch" => {
                for child in el.child_elements() {
                    self.walk(child, &state, depth);
                }
            }
            "use" => self.expand_use(el, state, depth),
            _ => {
                if let Some(shape) = shape_of(el) {
                    self.out.push(GeometryElement {
                        shape,
                        fill: state.fill,
                        stroke: state.stroke,
                        stroke_width: state.stroke_width,
                        opacity: state.opacity,
                        fill_opacity: state.fill_opacity,
                        stroke_opacity: state.stroke_opacity,
                        fill_rule: state.fill_rule,
                        line_cap: state.line_cap,
                        line_join: state.line_join,
                        transform: el.attr("transform").map(str::to_string),
                        matrix: state.matrix,
                    });
                }
            }
        }

        self.open.pop();
    }

    fn expand_use(&mut self, el: &'a Element, mut state: Inherited, depth: usize) {
        if depth >= MAX_USE_DEPTH {
            return;
        }
        let Some(target) = use_target(self.doc, el) else {
            return;
        };
        if self.open.iter().any(|open| std::ptr::eq(*open, target)) {
            debug!("svg"; "skipping recursive <use> of #{}", target.attr("id").unwrap_or_default());
            return;
        }

        let offset = Matrix::translate(number_attr(el, "x"), number_attr(el, "y"));
        state.matrix = state.matrix.then_inner(&offset);
        if target.local_name() == "symbol" {
            self.open.push(target);
            for child in target.child_elements() {
                self.walk(child, &state, depth + 1);
            }
            self.open.pop();
        } else {
            self.walk(target, &state, depth + 1);
        }
    }
}

fn use_target<'a>(doc: &'a Document, el: &Element) -> Option<&'a Element> {
    let href = el.attr("href").or_else(|| el.attr("xlink:href"))?;
    doc.find_by_id(href.strip_prefix('#')?)
}

/// Geometry of one drawable element; degenerate shapes yield `None`.
fn shape_of(el: &Element) -> Option<Shape> {
    let shape = match el.local_name() {
        "path" => {
            let segments = parse_path(el.attr("d")?);
            if segments.is_empty() {
                return None;
            }
            Shape::Path(segments)
        }
        "rect" => {
            let width = number_attr(el, "width");
            let height = number_attr(el, "height");
            if width <= 0.0 || height <= 0.0 {
                return None;
            }
            let (rx, ry) = corner_radii(el, width, height);
            Shape::Rect {
                x: number_attr(el, "x"),
                y: number_attr(el, "y"),
                width,
                height,
                rx,
                ry,
            }
        }
        "circle" => {
            let r = number_attr(el, "r");
            if r <= 0.0 {
                return None;
            }
            Shape::Circle {
                cx: number_attr(el, "cx"),
                cy: number_attr(el, "cy"),
                r,
            }
        }
        "ellipse" => {
            let (rx, ry) = match (positive_attr(el, "rx"), positive_attr(el, "ry")) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => return None,
            };
            Shape::Ellipse {
                cx: number_attr(el, "cx"),
                cy: number_attr(el, "cy"),
                rx,
                ry,
            }
        }
        "line" => Shape::Line {
            x1: number_attr(el, "x1"),
            y1: number_attr(el, "y1"),
            x2: number_attr(el, "x2"),
            y2: number_attr(el, "y2"),
        },
        "polyline" | "polygon" => {
            let points = parse_points(el.attr("points")?);
            if points.len() < 2 {
                return None;
            }
            if el.local_name() == "polygon" {
                Shape::Polygon(points)
            } else {
                Shape::Polyline(points)
            }
        }
        _ => return None,
    };
    Some(shape)
}

fn positive_attr(el: &Element, name: &str) -> Option<f64> {
    el.has_attr(name)
        .then(|| number_attr(el, name))
        .filter(|v| *v > 0.0)
}

/// `rx`/`ry` with the auto rule (a missing radius copies the other one),
/// clamped to half the side.
fn corner_radii(el: &Element, width: f64, height: f64) -> (f64, f64) {
    let (rx, ry) = match (positive_attr(el, "rx"), positive_attr(el, "ry")) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    (rx.min(width / 2.0), ry.min(height / 2.0))
}

fn parse_number(value: &str) -> Option<f64> {
    let v = value.trim();
    v.strip_suffix("px").unwrap_or(v).trim().parse().ok()
}

/// Opacity as a number or percentage, clamped to `0..=1`.
pub fn parse_opacity(value: &str) -> Option<f64> {
    let v = value.trim();
    let parsed = match v.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => v.parse::<f64>().ok()?,
    };
    Some(parsed.clamp(0.0, 1.0))
}

fn rect_segments(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> Vec<Segment> {
    let p = Point::new;
    if rx <= 0.0 || ry <= 0.0 {
        return vec![
            Segment::MoveTo(p(x, y)),
            Segment::LineTo(p(x + w, y)),
            Segment::LineTo(p(x + w, y + h)),
            Segment::LineTo(p(x, y + h)),
            Segment::Close,
        ];
    }
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let (right, bottom) = (x + w, y + h);
    vec![
        Segment::MoveTo(p(x + rx, y)),
        Segment::LineTo(p(right - rx, y)),
        Segment::CubicTo(p(right - rx + kx, y), p(right, y + ry - ky), p(right, y + ry)),
        Segment::LineTo(p(right, bottom - ry)),
        Segment::CubicTo(
            p(right, bottom - ry + ky),
            p(right - rx + kx, bottom),
            p(right - rx, bottom),
        ),
        Segment::LineTo(p(x + rx, bottom)),
        Segment::CubicTo(p(x + rx - kx, bottom), p(x, bottom - ry + ky), p(x, bottom - ry)),
        Segment::LineTo(p(x, y + ry)),
        Segment::CubicTo(p(x, y + ry - ky), p(x + rx - kx, y), p(x + rx, y)),
        Segment::Close,
    ]
}

/// Four cubic arcs, starting at the rightmost point and running clockwise
/// in SVG's y-down space.
fn ellipse_segments(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Segment> {
    let p = Point::new;
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    vec![
        Segment::MoveTo(p(cx + rx, cy)),
        Segment::CubicTo(p(cx + rx, cy + ky), p(cx + kx, cy + ry), p(cx, cy + ry)),
        Segment::CubicTo(p(cx - kx, cy + ry), p(cx - rx, cy + ky), p(cx - rx, cy)),
        Segment::CubicTo(p(cx - rx, cy - ky), p(cx - kx, cy - ry), p(cx, cy - ry)),
        Segment::CubicTo(p(cx + kx, cy - ry), p(cx + rx, cy - ky), p(cx + rx, cy)),
        Segment::Close,
    ]
}

fn polyline_segments(points: &[Point], closed: bool) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(points.len() + 1);
    for (i, &point) in points.iter().enumerate() {
        segments.push(if i == 0 {
            Segment::MoveTo(point)
        } else {
            Segment::LineTo(point)
        });
    }
    if closed {
        segments.push(Segment::Close);
    }
    segments
}
