//! SVG to Encapsulated PostScript.
//!
//! PostScript has its origin at the bottom left, so every y coordinate is
//! flipped against the page height. Element transforms are conjugated by
//! the same flip and emitted as a single `concat`.
//!
//! # Output layout
//!
//! ```text
//! %!PS-Adobe-3.0 EPSF-3.0     header, padded bounding boxes
//! %%BeginProlog ... %%EndProlog  m l c cp f ef s rgb lw rrect ellipse
//! gsave
//!   gsave <concat> <color> <path> <paint> grestore   one per element
//! grestore showpage %%EOF
//! ```

use std::fmt::Write;

use anyhow::{Context, Result, ensure};

use crate::color::{Color, ColorTag, rewrite::paint_reference};
use crate::log;
use crate::svg::geometry::{self, FillRule, GeometryElement, LineCap, LineJoin, Shape};
use crate::svg::path::{Point, Segment};
use crate::svg::transform::Matrix;
use crate::svg::{Document, PageBox, parse_svg};

/// Marker comment for the empty-document placeholder.
pub const PLACEHOLDER_MARKER: &str = "% placeholder";
/// Marker comment for the conversion-failure fallback.
pub const FALLBACK_MARKER: &str = "% fallback";

const PROLOG: &str = "\
/m { moveto } bind def
/l { lineto } bind def
/c { curveto } bind def
/cp { closepath } bind def
/f { fill } bind def
/ef { eofill } bind def
/s { stroke } bind def
/rgb { setrgbcolor } bind def
/lw { setlinewidth } bind def
% x y w h rx ry rrect
/rrect {
  8 dict begin
  /ry exch def /rx exch def /h exch def /w exch def /y exch def /x exch def
  /kx rx 0.5522848 mul def /ky ry 0.5522848 mul def
  x rx add y moveto
  x w add rx sub y lineto
  x w add rx sub kx add y x w add y ry add ky sub x w add y ry add curveto
  x w add y h add ry sub lineto
  x w add y h add ry sub ky add x w add rx sub kx add y h add x w add rx sub y h add curveto
  x rx add y h add lineto
  x rx add kx sub y h add x y h add ry sub ky add x y h add ry sub curveto
  x y ry add lineto
  x y ry add ky sub x rx add kx sub y x rx add y curveto
  closepath
  end
} bind def
% cx cy rx ry ellipse
/ellipse {
  matrix currentmatrix 5 1 roll
  4 2 roll translate scale
  0 0 1 0 360 arc closepath
  setmatrix
} bind def
";

/// Convert SVG markup to EPS. Never fails: unparseable input or a
/// conversion error yields [`fallback`].
pub fn svg_to_eps(source: &str, tag: &ColorTag) -> String {
    match parse_svg(source) {
        Ok(doc) => to_eps(&doc, tag),
        Err(e) => {
            log!("eps"; "cannot parse SVG ({}), using fallback", e);
            fallback(tag)
        }
    }
}

/// Convert a parsed document to EPS, substituting [`fallback`] on error.
pub fn to_eps(doc: &Document, tag: &ColorTag) -> String {
    match render(doc, tag) {
        Ok(eps) => eps,
        Err(e) => {
            log!("eps"; "conversion failed ({:#}), using fallback", e);
            fallback(tag)
        }
    }
}

/// Convert a parsed document to EPS.
pub fn render(doc: &Document, tag: &ColorTag) -> Result<String> {
    let page = PageBox::of(doc);
    let mut out = String::new();
    write_header(&mut out, &page, &tag.label());

    // Move the viewBox origin to (0, 0).
    let origin = Matrix::translate(-page.min_x, -page.min_y);
    let elements = geometry::collect_by_kind(doc);

    if elements.is_empty() {
        write_placeholder(&mut out, &page);
    }
    for (index, el) in elements.iter().enumerate() {
        write_element(&mut out, el, &origin, page.height)
            .with_context(|| format!("element {index} ({:?})", el.kind()))?;
    }

    write_footer(&mut out);
    Ok(out)
}

/// Fixed artwork (triangle and circle) used when conversion fails.
pub fn fallback(tag: &ColorTag) -> String {
    let page = PageBox::sized(100.0, 100.0);
    let mut out = String::new();
    write_header(&mut out, &page, &tag.label());
    out.push_str(FALLBACK_MARKER);
    out.push('\n');
    out.push_str(
        "gsave\n\
         0 0 0 rgb\n\
         newpath 50 90 m 90 20 l 10 20 l cp f\n\
         grestore\n\
         gsave\n\
         0.5 0.5 0.5 rgb\n\
         newpath 50 45 18 18 ellipse f\n\
         grestore\n",
    );
    write_footer(&mut out);
    out
}

// ============================================================================
// Document frame
// ============================================================================

fn write_header(out: &mut String, page: &PageBox, title: &str) {
    let pad = padding(page);
    let (urx, ury) = (page.width + pad, page.height + pad);
    let _ = write!(
        out,
        "%!PS-Adobe-3.0 EPSF-3.0\n\
         %%Creator: brandkit {}\n\
         %%Title: {}\n\
         %%BoundingBox: {} {} {} {}\n\
         %%HiResBoundingBox: {} {} {} {}\n\
         %%Pages: 1\n\
         %%EndComments\n\
         %%BeginProlog\n\
         {}\
         %%EndProlog\n\
         %%Page: 1 1\n\
         gsave\n",
        env!("CARGO_PKG_VERSION"),
        title,
        (-pad).floor(),
        (-pad).floor(),
        urx.ceil(),
        ury.ceil(),
        num(-pad),
        num(-pad),
        num(urx),
        num(ury),
        PROLOG,
    );
}

fn write_footer(out: &mut String) {
    out.push_str("grestore\nshowpage\n%%EOF\n");
}

/// `max(10, min(width, height) * 5%)`.
fn padding(page: &PageBox) -> f64 {
    (page.width.min(page.height) * 0.05).max(10.0)
}

fn write_placeholder(out: &mut String, page: &PageBox) {
    let side = page.width.min(page.height) * 0.4;
    let x = (page.width - side) / 2.0;
    let y = (page.height - side) / 2.0;
    let _ = writeln!(out, "{PLACEHOLDER_MARKER}");
    let _ = write!(
        out,
        "gsave\n0.8 0.8 0.8 rgb\nnewpath {x0} {y0} m {x1} {y0} l {x1} {y1} l {x0} {y1} l cp f\ngrestore\n",
        x0 = num(x),
        y0 = num(y),
        x1 = num(x + side),
        y1 = num(y + side),
    );
}

// ============================================================================
// Elements
// ============================================================================

fn write_element(
    out: &mut String,
    el: &GeometryElement,
    origin: &Matrix,
    height: f64,
) -> Result<()> {
    let fill = el.fill.as_deref().filter(|v| el.has_fill() && !is_none(v));
    let stroke = el.stroke.as_deref().filter(|v| el.has_stroke() && !is_none(v));
    if fill.is_none() && stroke.is_none() {
        return Ok(());
    }

    let geometry = shape_ops(&el.shape, height)?;
    out.push_str("gsave\n");

    let m = origin.then_inner(&el.matrix);
    if !m.is_identity() {
        ensure!(
            [m.a, m.b, m.c, m.d, m.e, m.f].iter().all(|v| v.is_finite()),
            "non-finite transform"
        );
        let _ = write!(
            out,
            "[{} {} {} {} {} {}] concat",
            num(m.a),
            num(-m.b),
            num(-m.c),
            num(m.d),
            num(m.e + m.c * height),
            num(height - m.d * height - m.f),
        );
        match &el.transform {
            Some(source) => {
                let _ = writeln!(out, " % {}", source.replace(['\n', '\r'], " "));
            }
            None => out.push('\n'),
        }
    }

    out.push_str("newpath\n");
    out.push_str(&geometry);

    let fill_op = match el.fill_rule {
        FillRule::NonZero => "f",
        FillRule::EvenOdd => "ef",
    };
    if let Some(value) = fill {
        out.push_str(&color_ops(value, el.fill_alpha()));
        if stroke.is_some() {
            let _ = writeln!(out, "gsave {fill_op} grestore");
        } else {
            let _ = writeln!(out, "{fill_op}");
        }
    }
    if let Some(value) = stroke {
        out.push_str(&color_ops(value, el.stroke_alpha()));
        let _ = write!(out, "{} lw", num(el.stroke_width));
        match el.line_cap {
            LineCap::Butt => {}
            LineCap::Round => out.push_str(" 1 setlinecap"),
            LineCap::Square => out.push_str(" 2 setlinecap"),
        }
        match el.line_join {
            LineJoin::Miter => {}
            LineJoin::Round => out.push_str(" 1 setlinejoin"),
            LineJoin::Bevel => out.push_str(" 2 setlinejoin"),
        }
        out.push_str(" s\n");
    }

    out.push_str("grestore\n");
    Ok(())
}

/// Path construction operators for a shape, y flipped against `height`.
fn shape_ops(shape: &Shape, height: f64) -> Result<String> {
    let flip = |p: Point| Point::new(p.x, height - p.y);
    let mut out = String::new();

    match *shape {
        Shape::Rect {
            x,
            y,
            width,
            height: h,
            rx,
            ry,
        } if rx > 0.0 && ry > 0.0 => {
            check(&[x, y, width, h, rx, ry])?;
            let _ = writeln!(
                out,
                "{} {} {} {} {} {} rrect",
                num(x),
                num(height - y - h),
                num(width),
                num(h),
                num(rx),
                num(ry)
            );
        }
        Shape::Circle { cx, cy, r } => {
            check(&[cx, cy, r])?;
            let _ = writeln!(out, "{} {} {} {} ellipse", num(cx), num(height - cy), num(r), num(r));
        }
        Shape::Ellipse { cx, cy, rx, ry } => {
            check(&[cx, cy, rx, ry])?;
            let _ = writeln!(out, "{} {} {} {} ellipse", num(cx), num(height - cy), num(rx), num(ry));
        }
        _ => {
            for segment in shape.to_segments() {
                match segment.map(flip) {
                    Segment::MoveTo(p) => {
                        check(&[p.x, p.y])?;
                        let _ = writeln!(out, "{} {} m", num(p.x), num(p.y));
                    }
                    Segment::LineTo(p) => {
                        check(&[p.x, p.y])?;
                        let _ = writeln!(out, "{} {} l", num(p.x), num(p.y));
                    }
                    Segment::CubicTo(c1, c2, p) => {
                        check(&[c1.x, c1.y, c2.x, c2.y, p.x, p.y])?;
                        let _ = writeln!(
                            out,
                            "{} {} {} {} {} {} c",
                            num(c1.x),
                            num(c1.y),
                            num(c2.x),
                            num(c2.y),
                            num(p.x),
                            num(p.y)
                        );
                    }
                    Segment::Close => out.push_str("cp\n"),
                }
            }
        }
    }
    Ok(out)
}

fn check(values: &[f64]) -> Result<()> {
    ensure!(values.iter().all(|v| v.is_finite()), "non-finite coordinate");
    Ok(())
}

// ============================================================================
// Colors
// ============================================================================

fn is_none(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent")
}

/// `r g b rgb`, with alpha below 1 blended toward white.
fn color_ops(value: &str, alpha: f64) -> String {
    let (color, comment) = match Color::parse(value) {
        Some(color) => (color, None),
        None if paint_reference(value).is_some() => (
            Color::opaque(crate::color::Rgb::BLACK),
            Some(format!("% {} not supported, using black", value.trim())),
        ),
        None => (
            Color::opaque(crate::color::Rgb::BLACK),
            Some(format!("% unsupported color '{}', using black", value.trim())),
        ),
    };

    let alpha = (color.alpha * alpha).clamp(0.0, 1.0);
    let (r, g, b) = color.rgb.to_unit();
    let blend = |channel: f64| channel * alpha + (1.0 - alpha);

    let mut out = String::new();
    if let Some(comment) = comment {
        let _ = writeln!(out, "{comment}");
    }
    let _ = writeln!(out, "{} {} {} rgb", num(blend(r)), num(blend(g)), num(blend(b)));
    out
}

/// Format a number with at most three decimals and no trailing zeros.
fn num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
