//! In-process rendering with resvg.

use std::fs;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use resvg::tiny_skia::{Pixmap, Transform};

use super::{FALLBACK_SIZE, RenderError, RenderSurface, SourceContent, SourceImage};

/// Builtin surface: SVG through usvg/resvg, bitmaps through `image`.
pub struct ResvgSurface {
    options: usvg::Options<'static>,
}

impl Default for ResvgSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgSurface {
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        // Documents with neither viewBox nor absolute size.
        if let Some(size) = usvg::Size::from_wh(FALLBACK_SIZE as f32, FALLBACK_SIZE as f32) {
            options.default_size = size;
        }
        Self { options }
    }

    fn parse_tree(&self, data: &[u8]) -> Result<usvg::Tree, RenderError> {
        usvg::Tree::from_data(data, &self.options).map_err(|e| RenderError::ImageLoad(e.to_string()))
    }
}

impl RenderSurface for ResvgSurface {
    fn decode(&self, data: &[u8]) -> Result<SourceImage, RenderError> {
        if image::guess_format(data).is_ok() {
            let pixels = image::load_from_memory(data)
                .map_err(|e| RenderError::ImageLoad(e.to_string()))?
                .to_rgba8();
            return Ok(SourceImage::bitmap(pixels));
        }

        let tree = self.parse_tree(data)?;
        let size = tree.size();
        Ok(SourceImage::new(
            f64::from(size.width()),
            f64::from(size.height()),
            SourceContent::Vector(tree),
        ))
    }

    fn draw_scaled(
        &self,
        image: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        match image.content() {
            SourceContent::Vector(tree) => render_tree(tree, width, height),
            SourceContent::Bitmap(pixels) => {
                if pixels.dimensions() == (width, height) {
                    Ok(pixels.clone())
                } else {
                    Ok(imageops::resize(pixels, width, height, FilterType::Lanczos3))
                }
            }
            SourceContent::File(path) => {
                let data = fs::read(path).map_err(|e| RenderError::ImageLoad(e.to_string()))?;
                let tree = self.parse_tree(&data)?;
                render_tree(&tree, width, height)
            }
        }
    }
}

/// Render `tree` stretched to `width` x `height`, as straight alpha.
fn render_tree(tree: &usvg::Tree, width: u32, height: u32) -> Result<RgbaImage, RenderError> {
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;

    let size = tree.size();
    let transform = Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied RGBA.
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(width, height, data).ok_or(RenderError::Surface { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED_SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"><rect width="50" height="50" fill="#ff0000" fill-opacity="0.5"/></svg>"##;

    #[test]
    fn test_decode_svg_size() {
        let surface = ResvgSurface::new();
        let image = surface.decode(RED_SQUARE.as_bytes()).unwrap();
        assert_eq!(image.size(), (100.0, 50.0));
        assert!(image.pixels().is_none());
    }

    #[test]
    fn test_decode_svg_without_size() {
        let surface = ResvgSurface::new();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="5" cy="5" r="5"/></svg>"#;
        let image = surface.decode(svg.as_bytes()).unwrap();
        assert_eq!(image.size(), (300.0, 300.0));
    }

    #[test]
    fn test_draw_scaled_straight_alpha() {
        let surface = ResvgSurface::new();
        let image = surface.decode(RED_SQUARE.as_bytes()).unwrap();
        let pixels = surface.draw_scaled(&image, 200, 100).unwrap();
        assert_eq!(pixels.dimensions(), (200, 100));

        let inside = pixels.get_pixel(50, 50);
        assert_eq!(inside[0], 255);
        assert!((126..=129).contains(&inside[3]), "alpha {}", inside[3]);
        assert_eq!(pixels.get_pixel(150, 50)[3], 0);
    }

    #[test]
    fn test_decode_bitmap() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let png = crate::raster::encode_png(&img).unwrap();

        let surface = ResvgSurface::new();
        let image = surface.decode(&png).unwrap();
        assert_eq!(image.size(), (4.0, 2.0));
        let scaled = surface.draw_scaled(&image, 8, 4).unwrap();
        assert_eq!(scaled.dimensions(), (8, 4));
    }

    #[test]
    fn test_decode_garbage_is_image_load_error() {
        let surface = ResvgSurface::new();
        let err = surface.decode(b"not an image").unwrap_err();
        assert!(matches!(err, RenderError::ImageLoad(_)));
    }
}
