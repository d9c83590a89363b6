//! A pixel buffer embedded as one image.

use anyhow::{Result, ensure};
use image::RgbaImage;
use pdf_writer::{Content, Name};

use super::{PageWriter, Placement};

/// Embed `pixels` as a DeviceRGB image with a DeviceGray soft mask,
/// scaled and centered like the vector path.
pub fn render_raster(pixels: &RgbaImage, page_size: f32) -> Result<Vec<u8>> {
    let (width, height) = pixels.dimensions();
    ensure!(width > 0 && height > 0, "empty image");

    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for pixel in pixels.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let mut writer = PageWriter::new(page_size);
    let mask = writer.image(&alpha, width, height, false, None)?;
    let image = writer.image(&rgb, width, height, true, Some(mask))?;
    writer.x_objects.push(("Im0".to_string(), image));

    let place = Placement::fit(f64::from(width), f64::from(height), f64::from(page_size));
    let mut content = Content::new();
    content.save_state();
    content.transform([
        (f64::from(width) * place.scale) as f32,
        0.0,
        0.0,
        (f64::from(height) * place.scale) as f32,
        place.offset_x as f32,
        place.offset_y as f32,
    ]);
    content.x_object(Name(b"Im0"));
    content.restore_state();

    Ok(writer.finish(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::contains;
    use image::Rgba;

    #[test]
    fn test_embeds_image_with_smask() {
        let pixels = RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 128]));
        let out = render_raster(&pixels, 600.0).unwrap();
        assert!(out.starts_with(b"%PDF-"));
        assert!(contains(&out, "/SMask"));
        assert!(contains(&out, "/DeviceGray"));
        assert!(contains(&out, "/DeviceRGB"));
        assert!(contains(&out, "/FlateDecode"));
        assert!(contains(&out, "/Im0 Do"));
        // 20x10 scaled by 24, centered vertically
        assert!(contains(&out, "480 0 0 240 60 180 cm"));
    }

    #[test]
    fn test_empty_image_rejected() {
        assert!(render_raster(&RgbaImage::new(0, 0), 600.0).is_err());
    }
}
