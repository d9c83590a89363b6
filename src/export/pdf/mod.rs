//! Single-page PDF output.
//!
//! - [`vector`]: SVG primitives redrawn as native PDF paths
//! - [`raster`]: one embedded image with a soft mask for alpha
//!
//! Both place the artwork at 80% of a square page, centered. When either
//! fails, [`fallback`] produces a page carrying a short text note.

mod raster;
mod vector;

pub use raster::render_raster;
pub use vector::render_vector;

use std::io::Write;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use crate::log;
use crate::svg::Document;

/// Share of the page the artwork may occupy.
const FIT: f64 = 0.8;

/// Convert a document with the vector path, falling back to a text note.
pub fn to_pdf(doc: &Document, page_size: f32) -> Vec<u8> {
    render_vector(doc, page_size).unwrap_or_else(|e| {
        log!("pdf"; "vector conversion failed ({:#}), using fallback", e);
        fallback("vector conversion failed", page_size)
    })
}

/// Embed a pixel buffer, falling back to a text note.
pub fn raster_to_pdf(pixels: &RgbaImage, page_size: f32) -> Vec<u8> {
    render_raster(pixels, page_size).unwrap_or_else(|e| {
        log!("pdf"; "raster embedding failed ({:#}), using fallback", e);
        fallback("raster conversion failed", page_size)
    })
}

/// Minimal one-page PDF with a Helvetica note.
pub fn fallback(note: &str, page_size: f32) -> Vec<u8> {
    let mut page = PageWriter::new(page_size);
    let font = page.alloc_ref();
    page.pdf.type1_font(font).base_font(Name(b"Helvetica"));
    page.fonts.push(("F1".to_string(), font));

    let text: Vec<u8> = format!("brandkit: {note}")
        .bytes()
        .map(|b| if b.is_ascii_graphic() || b == b' ' { b } else { b'?' })
        .collect();

    let mut content = Content::new();
    content.begin_text();
    content.set_font(Name(b"F1"), 14.0);
    content.next_line(36.0, page_size / 2.0);
    content.show(Str(&text));
    content.end_text();
    page.finish(content)
}

// ============================================================================
// Page assembly
// ============================================================================

/// Placement of source content on the page: uniform scale, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    page: f64,
}

impl Placement {
    fn fit(width: f64, height: f64, page: f64) -> Self {
        let scale = (FIT * page / width).min(FIT * page / height);
        Self {
            scale,
            offset_x: (page - width * scale) / 2.0,
            offset_y: (page - height * scale) / 2.0,
            page,
        }
    }
}

/// One page document under construction.
///
/// Fixed ids: catalog 1, page tree 2, page 3, content 4. Everything else
/// is allocated from 5 upward.
struct PageWriter {
    pdf: Pdf,
    size: f32,
    next_id: i32,
    ext_states: Vec<(String, Ref)>,
    x_objects: Vec<(String, Ref)>,
    fonts: Vec<(String, Ref)>,
}

const CATALOG_ID: Ref = Ref::new(1);
const PAGE_TREE_ID: Ref = Ref::new(2);
const PAGE_ID: Ref = Ref::new(3);
const CONTENT_ID: Ref = Ref::new(4);

impl PageWriter {
    fn new(size: f32) -> Self {
        Self {
            pdf: Pdf::new(),
            size,
            next_id: 5,
            ext_states: Vec::new(),
            x_objects: Vec::new(),
            fonts: Vec::new(),
        }
    }

    fn alloc_ref(&mut self) -> Ref {
        let reference = Ref::new(self.next_id);
        self.next_id += 1;
        reference
    }

    /// Register a graphics state with fill and stroke alpha; returns its name.
    fn alpha_state(&mut self, fill: f32, stroke: f32) -> String {
        let name = format!("G{}", self.ext_states.len());
        let id = self.alloc_ref();
        self.pdf
            .ext_graphics(id)
            .non_stroking_alpha(fill)
            .stroking_alpha(stroke);
        self.ext_states.push((name.clone(), id));
        name
    }

    /// Write `samples` as a Flate-compressed image XObject.
    fn image(
        &mut self,
        samples: &[u8],
        width: u32,
        height: u32,
        rgb: bool,
        mask: Option<Ref>,
    ) -> Result<Ref> {
        let data = deflate(samples)?;
        let id = self.alloc_ref();
        let mut image = self.pdf.image_xobject(id, &data);
        image.filter(Filter::FlateDecode);
        image.width(i32::try_from(width).context("image too wide")?);
        image.height(i32::try_from(height).context("image too tall")?);
        if rgb {
            image.color_space().device_rgb();
        } else {
            image.color_space().device_gray();
        }
        image.bits_per_component(8);
        if let Some(mask) = mask {
            image.s_mask(mask);
        }
        image.finish();
        Ok(id)
    }

    fn finish(mut self, content: Content) -> Vec<u8> {
        self.pdf.catalog(CATALOG_ID).pages(PAGE_TREE_ID);
        self.pdf.pages(PAGE_TREE_ID).kids([PAGE_ID]).count(1);

        let mut page = self.pdf.page(PAGE_ID);
        page.media_box(Rect::new(0.0, 0.0, self.size, self.size));
        page.parent(PAGE_TREE_ID);
        page.contents(CONTENT_ID);

        let mut resources = page.resources();
        if !self.ext_states.is_empty() {
            let mut states = resources.ext_g_states();
            for (name, id) in &self.ext_states {
                states.pair(Name(name.as_bytes()), *id);
            }
        }
        if !self.x_objects.is_empty() {
            let mut objects = resources.x_objects();
            for (name, id) in &self.x_objects {
                objects.pair(Name(name.as_bytes()), *id);
            }
        }
        if !self.fonts.is_empty() {
            let mut fonts = resources.fonts();
            for (name, id) in &self.fonts {
                fonts.pair(Name(name.as_bytes()), *id);
            }
        }
        resources.finish();
        page.finish();

        let data = content.finish();
        self.pdf.stream(CONTENT_ID, &data);
        self.pdf.finish()
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).context("Failed to compress stream")?;
    encoder.finish().context("Failed to compress stream")
}

#[cfg(test)]
pub(crate) fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_centers() {
        let p = Placement::fit(200.0, 100.0, 600.0);
        assert!((p.scale - 2.4).abs() < 1e-9);
        assert!((p.offset_x - 60.0).abs() < 1e-9);
        assert!((p.offset_y - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_is_pdf_with_note() {
        let pdf = fallback("vector (conversion) failed", 600.0);
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(contains(&pdf, "/Helvetica"));
        assert!(contains(&pdf, "conversion"));
        assert!(contains(&pdf, "/MediaBox [0 0 600 600]"));
    }

    #[test]
    fn test_deflate_roundtrip() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let compressed = deflate(b"brandkit brandkit brandkit").unwrap();
        let mut out = String::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "brandkit brandkit brandkit");
    }
}
