//! SVG primitives redrawn with native PDF operators.

use anyhow::{Result, ensure};
use pdf_writer::types::{LineCapStyle, LineJoinStyle};
use pdf_writer::{Content, Name};

use super::{PageWriter, Placement};
use crate::color::{Color, Rgb, solid_paint};
use crate::debug;
use crate::svg::geometry::{self, FillRule, GeometryElement, LineCap, LineJoin, Shape};
use crate::svg::path::{Point, Segment};
use crate::svg::{Document, PageBox};

/// Redraw the document's drawables on one page.
///
/// Elements are drawn in document order. A document with nothing to draw
/// gets a half-transparent rectangle over the artwork area.
pub fn render_vector(doc: &Document, page_size: f32) -> Result<Vec<u8>> {
    let page = PageBox::of(doc);
    let place = Placement::fit(page.width, page.height, f64::from(page_size));
    let mut writer = PageWriter::new(page_size);
    let mut content = Content::new();
    let mut states: Vec<((u32, u32), String)> = Vec::new();

    let mut drawn = 0;
    for el in geometry::collect(doc) {
        let Some(paint) = Paint::resolve(doc, &el) else {
            continue;
        };
        content.save_state();

        let alpha = (quantize(paint.fill_alpha), quantize(paint.stroke_alpha));
        if alpha != (1000, 1000) {
            let name = match states.iter().find(|(key, _)| *key == alpha) {
                Some((_, name)) => name.clone(),
                None => {
                    let name = writer.alpha_state(paint.fill_alpha as f32, paint.stroke_alpha as f32);
                    states.push((alpha, name.clone()));
                    name
                }
            };
            content.set_parameters(Name(name.as_bytes()));
        }

        if let Some(rgb) = paint.fill {
            let (r, g, b) = rgb.to_unit();
            content.set_fill_rgb(r as f32, g as f32, b as f32);
        }
        if let Some(rgb) = paint.stroke {
            let (r, g, b) = rgb.to_unit();
            content.set_stroke_rgb(r as f32, g as f32, b as f32);
            let width = el.stroke_width * place.scale * el.matrix.det().abs().sqrt();
            content.set_line_width(width as f32);
            content.set_line_cap(match el.line_cap {
                LineCap::Butt => LineCapStyle::ButtCap,
                LineCap::Round => LineCapStyle::RoundCap,
                LineCap::Square => LineCapStyle::ProjectingSquareCap,
            });
            content.set_line_join(match el.line_join {
                LineJoin::Miter => LineJoinStyle::MiterJoin,
                LineJoin::Round => LineJoinStyle::RoundJoin,
                LineJoin::Bevel => LineJoinStyle::BevelJoin,
            });
        }

        draw_shape(&mut content, &el, &page, &place)?;

        match (paint.fill.is_some(), paint.stroke.is_some(), el.fill_rule) {
            (true, true, FillRule::NonZero) => content.fill_nonzero_and_stroke(),
            (true, true, FillRule::EvenOdd) => content.fill_even_odd_and_stroke(),
            (true, false, FillRule::NonZero) => content.fill_nonzero(),
            (true, false, FillRule::EvenOdd) => content.fill_even_odd(),
            (false, _, _) => content.stroke(),
        };
        content.restore_state();
        drawn += 1;
    }

    if drawn == 0 {
        debug!("pdf"; "no drawable elements, drawing placeholder rectangle");
        let name = writer.alpha_state(0.5, 0.5);
        content.save_state();
        content.set_parameters(Name(name.as_bytes()));
        content.set_fill_rgb(0.0, 0.0, 0.0);
        content.rect(
            place.offset_x as f32,
            place.offset_y as f32,
            (page.width * place.scale) as f32,
            (page.height * place.scale) as f32,
        );
        content.fill_nonzero();
        content.restore_state();
    }

    Ok(writer.finish(content))
}

/// Resolved paint for one element; `None` fields are not painted.
struct Paint {
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
    fill_alpha: f64,
    stroke_alpha: f64,
}

impl Paint {
    fn resolve(doc: &Document, el: &GeometryElement) -> Option<Self> {
        let fill = el
            .fill
            .as_deref()
            .filter(|_| el.has_fill())
            .and_then(|v| resolve_color(doc, v));
        let stroke = el
            .stroke
            .as_deref()
            .filter(|_| el.has_stroke())
            .and_then(|v| resolve_color(doc, v));
        if fill.is_none() && stroke.is_none() {
            return None;
        }
        Some(Self {
            fill_alpha: fill.map_or(1.0, |c| c.alpha * el.fill_alpha()),
            stroke_alpha: stroke.map_or(1.0, |c| c.alpha * el.stroke_alpha()),
            fill: fill.map(|c| c.rgb),
            stroke: stroke.map(|c| c.rgb),
        })
    }
}

/// Paint value to a color. Gradients flatten to one solid color and
/// anything unresolvable paints black; `none`/`transparent` paint nothing.
fn resolve_color(doc: &Document, value: &str) -> Option<Color> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent") {
        return None;
    }
    if let Some(color) = Color::parse(value) {
        return Some(color);
    }
    Some(Color::opaque(solid_paint(doc, value).unwrap_or(Rgb::BLACK)))
}

/// Alpha as an integer key in thousandths.
fn quantize(alpha: f64) -> u32 {
    (alpha.clamp(0.0, 1.0) * 1000.0).round() as u32
}

fn draw_shape(
    content: &mut Content,
    el: &GeometryElement,
    page: &PageBox,
    place: &Placement,
) -> Result<()> {
    let to_page = |p: Point| {
        let p = el.matrix.apply(p);
        let x = place.offset_x + (p.x - page.min_x) * place.scale;
        let y = place.page - (place.offset_y + (p.y - page.min_y) * place.scale);
        Point::new(x, y)
    };

    // Axis-aligned sharp rectangles keep the native operator.
    if let Shape::Rect {
        x,
        y,
        width,
        height,
        rx,
        ry,
    } = el.shape
        && (rx <= 0.0 || ry <= 0.0)
        && el.matrix.b == 0.0
        && el.matrix.c == 0.0
    {
        let a = to_page(Point::new(x, y));
        let b = to_page(Point::new(x + width, y + height));
        ensure!(finite(&[a, b]), "non-finite rectangle");
        content.rect(
            a.x.min(b.x) as f32,
            a.y.min(b.y) as f32,
            (a.x - b.x).abs() as f32,
            (a.y - b.y).abs() as f32,
        );
        return Ok(());
    }

    for segment in el.shape.to_segments() {
        match segment.map(to_page) {
            Segment::MoveTo(p) => {
                ensure!(finite(&[p]), "non-finite coordinate");
                content.move_to(p.x as f32, p.y as f32);
            }
            Segment::LineTo(p) => {
                ensure!(finite(&[p]), "non-finite coordinate");
                content.line_to(p.x as f32, p.y as f32);
            }
            Segment::CubicTo(c1, c2, p) => {
                ensure!(finite(&[c1, c2, p]), "non-finite coordinate");
                content.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                );
            }
            Segment::Close => {
                content.close_path();
            }
        }
    }
    Ok(())
}

fn finite(points: &[Point]) -> bool {
    points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
}
