//! Raster rendering.
//!
//! A [`RenderSurface`] turns uploaded bytes into a [`SourceImage`] and draws
//! it at an exact pixel size. Color modes are then applied per pixel with
//! [`apply_color`], and the result is encoded as PNG, JPG or ICO.
//!
//! # Surfaces
//!
//! - [`ResvgSurface`]: in-process resvg for SVG, `image` for bitmaps
//! - [`BackendSurface`]: an external CLI backend (Inkscape, ImageMagick)

mod backend;
mod builtin;
mod encode;

pub use backend::BackendSurface;
pub use builtin::ResvgSurface;
pub use encode::{encode_ico, encode_jpeg, encode_png};

use image::{RgbaImage, imageops};
use tempfile::TempPath;
use thiserror::Error;

use crate::color::ColorTag;

/// Intrinsic size used when a source declares none.
pub const FALLBACK_SIZE: f64 = 300.0;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The source bytes could not be decoded.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    /// A pixel surface of the requested size could not be created.
    #[error("cannot create a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    /// The requested surface exceeds the configured pixel budget.
    #[error("a {width}x{height} surface exceeds the limit of {max_pixels} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error(transparent)]
    Backend(#[from] crate::backend::BackendError),
}

/// What a [`SourceImage`] holds.
#[derive(Debug)]
pub enum SourceContent {
    /// A parsed SVG tree, drawn in process.
    Vector(usvg::Tree),
    /// Decoded straight-alpha pixels.
    Bitmap(RgbaImage),
    /// SVG written to a temp file for an external backend.
    /// The file is removed when the image is dropped.
    File(TempPath),
}

/// A decoded source with its intrinsic size in CSS pixels.
#[derive(Debug)]
pub struct SourceImage {
    width: f64,
    height: f64,
    content: SourceContent,
}

impl SourceImage {
    pub fn new(width: f64, height: f64, content: SourceContent) -> Self {
        let valid = |v: f64| if v.is_finite() && v > 0.0 { v } else { FALLBACK_SIZE };
        Self {
            width: valid(width),
            height: valid(height),
            content,
        }
    }

    pub fn bitmap(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self::new(f64::from(width), f64::from(height), SourceContent::Bitmap(pixels))
    }

    /// Intrinsic `(width, height)`.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn content(&self) -> &SourceContent {
        &self.content
    }

    /// Pixels of a bitmap source.
    pub fn pixels(&self) -> Option<&RgbaImage> {
        match &self.content {
            SourceContent::Bitmap(pixels) => Some(pixels),
            _ => None,
        }
    }
}

/// Capability to decode and draw source images.
pub trait RenderSurface {
    fn decode(&self, data: &[u8]) -> Result<SourceImage, RenderError>;

    /// Draw `image` scaled to exactly `width` x `height` pixels.
    fn draw_scaled(
        &self,
        image: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError>;
}

/// Intrinsic size of `image` in whole pixels.
pub fn natural_size(image: &SourceImage) -> (u32, u32) {
    let (width, height) = image.size();
    (to_pixels(width), to_pixels(height))
}

/// Output size in pixels for a base size in points at `dpi`.
///
/// `round(base * dpi / 72)`, at least one pixel.
pub fn target_size(base: (f64, f64), dpi: u32) -> (u32, u32) {
    let scale = f64::from(dpi) / 72.0;
    (to_pixels(base.0 * scale), to_pixels(base.1 * scale))
}

/// Largest size with the aspect ratio of `size` that fits `bounds`.
pub fn fit_within((width, height): (f64, f64), bounds: (u32, u32)) -> (u32, u32) {
    let (bw, bh) = (f64::from(bounds.0), f64::from(bounds.1));
    let scale = (bw / width).min(bh / height);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let fit = |v: f64, max: f64| (v * scale).round().clamp(1.0, max) as u32;
    (fit(width, bw), fit(height, bh))
}

/// `pixels` centered on a transparent `width` x `height` canvas.
pub fn center_on(pixels: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    imageops::overlay(
        &mut canvas,
        pixels,
        i64::from(width.saturating_sub(pixels.width()) / 2),
        i64::from(height.saturating_sub(pixels.height()) / 2),
    );
    canvas
}

/// Refuse a `width` x `height` surface above `max_pixels` before anything
/// is allocated for it.
pub fn check_area(width: u32, height: u32, max_pixels: u64) -> Result<(), RenderError> {
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(RenderError::TooLarge {
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(value: f64) -> u32 {
    value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Apply a color mode to every pixel. Alpha is never modified.
pub fn apply_color(mut pixels: RgbaImage, tag: &ColorTag) -> RgbaImage {
    if tag.is_identity() {
        return pixels;
    }
    for pixel in pixels.pixels_mut() {
        pixel.0 = tag.apply_pixel(pixel.0);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use image::Rgba;

    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 100, 50, 128]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 0]));
        img
    }

    #[test]
    fn test_target_size() {
        assert_eq!(target_size((100.0, 50.0), 72), (100, 50));
        assert_eq!(target_size((100.0, 50.0), 150), (208, 104));
        assert_eq!(target_size((100.0, 50.0), 300), (417, 208));
        assert_eq!(target_size((0.1, 0.1), 72), (1, 1));
    }

    #[test]
    fn test_check_area() {
        assert!(check_area(100, 100, 10_000).is_ok());
        let err = check_area(101, 100, 10_000).unwrap_err();
        assert!(matches!(err, RenderError::TooLarge { width: 101, .. }));
        // 400000pt at 300dpi does not overflow the product
        let (width, height) = target_size((400_000.0, 400_000.0), 300);
        assert!(check_area(width, height, u64::MAX / 2).is_ok());
        assert!(check_area(width, height, 64_000_000).is_err());
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within((200.0, 100.0), (32, 32)), (32, 16));
        assert_eq!(fit_within((100.0, 100.0), (32, 32)), (32, 32));
        assert_eq!(fit_within((1000.0, 1.0), (32, 32)), (32, 1));
        assert_eq!(fit_within((10.0, 10.0), (40, 20)), (20, 20));
    }

    #[test]
    fn test_center_on() {
        let dot = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        let out = center_on(&dot, 6, 4);
        assert_eq!(out.dimensions(), (6, 4));
        assert_eq!(out.get_pixel(2, 1).0, [9, 9, 9, 255]);
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(4, 1).0[3], 0);
    }

    #[test]
    fn test_natural_size() {
        let image = SourceImage::bitmap(RgbaImage::new(3, 2));
        assert_eq!(natural_size(&image), (3, 2));
    }

    #[test]
    fn test_apply_color_preserves_alpha() {
        let tags = [
            ColorTag::Black,
            ColorTag::White,
            ColorTag::Grayscale,
            ColorTag::Inverted,
            ColorTag::Custom(Rgb::new(1, 2, 3)),
        ];
        for tag in tags {
            let out = apply_color(sample(), &tag);
            assert_eq!(out.get_pixel(0, 0)[3], 128, "{tag:?}");
            assert_eq!(out.get_pixel(1, 0)[3], 0, "{tag:?}");
        }
    }

    #[test]
    fn test_apply_color_values() {
        let black = apply_color(sample(), &ColorTag::Black);
        assert_eq!(black.get_pixel(0, 0).0, [0, 0, 0, 128]);

        let white = apply_color(sample(), &ColorTag::White);
        assert_eq!(white.get_pixel(0, 0).0, [255, 255, 255, 128]);

        let gray = apply_color(sample(), &ColorTag::Grayscale);
        assert_eq!(gray.get_pixel(0, 0).0, [117, 117, 117, 128]);

        let inverted = apply_color(sample(), &ColorTag::Inverted);
        assert_eq!(inverted.get_pixel(0, 0).0, [55, 155, 205, 128]);
    }

    #[test]
    fn test_identity_modes_untouched() {
        assert_eq!(apply_color(sample(), &ColorTag::Original), sample());
        let unknown = ColorTag::parse("sepia");
        assert_eq!(apply_color(sample(), &unknown), sample());
    }

    #[test]
    fn test_invalid_size_falls_back() {
        let image = SourceImage::new(0.0, f64::NAN, SourceContent::Bitmap(RgbaImage::new(1, 1)));
        assert_eq!(image.size(), (FALLBACK_SIZE, FALLBACK_SIZE));
    }
}
