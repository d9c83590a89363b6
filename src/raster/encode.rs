//! Pixel buffer encoders.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb as Pixel, RgbImage, RgbaImage};

use crate::color::Rgb;

pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(pixels.clone())
        .write_to(&mut out, ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(out.into_inner())
}

/// Encode as JPEG, compositing onto `background` since JPEG has no alpha.
pub fn encode_jpeg(pixels: &RgbaImage, quality: u8, background: Rgb) -> Result<Vec<u8>> {
    let flat = flatten(pixels, background);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(&flat)
        .context("Failed to encode JPEG")?;
    Ok(out)
}

/// Icon output: a square PNG of `size` pixels.
///
/// The bytes are PNG even though the artifact is named `.ico`.
pub fn encode_ico(pixels: &RgbaImage, size: u32) -> Result<Vec<u8>> {
    if pixels.dimensions() == (size, size) {
        return encode_png(pixels);
    }
    encode_png(&imageops::resize(pixels, size, size, FilterType::Lanczos3))
}

fn flatten(pixels: &RgbaImage, background: Rgb) -> RgbImage {
    let (width, height) = pixels.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8, bg: u8| -> u8 {
            ((u16::from(c) * alpha + u16::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Pixel([blend(r, background.r), blend(g, background.g), blend(b, background.b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_roundtrip_keeps_alpha() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40]));
        let decoded = image::load_from_memory(&encode_png(&img).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_jpeg_flattens_transparency() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let jpeg = encode_jpeg(&img, 90, Rgb::WHITE).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert!(decoded.get_pixel(4, 4).0.iter().all(|&c| c > 250));
    }

    #[test]
    fn test_flatten_blends() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten(&img, Rgb::WHITE);
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn test_ico_is_square_png() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([1, 2, 3, 255]));
        let ico = encode_ico(&img, 32).unwrap();
        assert_eq!(&ico[1..4], b"PNG");
        let decoded = image::load_from_memory(&ico).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }
}
