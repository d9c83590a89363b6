//! Rendering through an external CLI backend.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tempfile::TempPath;

use super::{
    RenderError, RenderSurface, ResvgSurface, SourceContent, SourceImage, center_on, fit_within,
};
use crate::backend::{Backend, ExportType};
use crate::debug;
use crate::svg::{PageBox, parse_svg};

/// Surface that hands SVG sources to [`Backend::render`].
///
/// Each decoded SVG lives in its own randomly named temp file under
/// `temp_dir` until the [`SourceImage`] is dropped. Bitmaps never leave the
/// process.
pub struct BackendSurface {
    backend: Backend,
    temp_dir: PathBuf,
    bitmaps: ResvgSurface,
}

impl BackendSurface {
    pub fn new(backend: Backend, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            temp_dir: temp_dir.into(),
            bitmaps: ResvgSurface::new(),
        }
    }

    fn temp_file(&self, suffix: &str, data: &[u8]) -> Result<TempPath, RenderError> {
        let io_err = |e: std::io::Error| RenderError::ImageLoad(format!("temp file: {e}"));
        let mut file = tempfile::Builder::new()
            .prefix("brandkit-")
            .suffix(suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(io_err)?;
        file.write_all(data).map_err(io_err)?;
        Ok(file.into_temp_path())
    }

    fn render_file(
        &self,
        input: &Path,
        base_width: f64,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        let output = self.temp_file(".png", &[])?;
        // Backends measure in CSS pixels at 96 dpi.
        let dpi = (96.0 * f64::from(width) / base_width) as f32;
        self.backend
            .render(input, ExportType::Png, Some(dpi), &output)?;

        let data = fs::read(&output).map_err(|e| RenderError::ImageLoad(e.to_string()))?;
        let pixels = image::load_from_memory(&data)
            .map_err(|e| RenderError::ImageLoad(e.to_string()))?
            .to_rgba8();

        Ok(fit_output(pixels, width, height))
    }
}

/// Backends export the drawing area, which may not match the page the
/// target size came from; scale without distorting and center.
fn fit_output(pixels: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if pixels.dimensions() == (width, height) {
        return pixels;
    }
    debug!("backend"; "fitting {:?} into {}x{}", pixels.dimensions(), width, height);
    let (w, h) = pixels.dimensions();
    let (fit_w, fit_h) = fit_within((f64::from(w), f64::from(h)), (width, height));
    let scaled = imageops::resize(&pixels, fit_w, fit_h, FilterType::Lanczos3);
    center_on(&scaled, width, height)
}

impl RenderSurface for BackendSurface {
    fn decode(&self, data: &[u8]) -> Result<SourceImage, RenderError> {
        if image::guess_format(data).is_ok() {
            return self.bitmaps.decode(data);
        }

        let text = std::str::from_utf8(data).map_err(|e| RenderError::ImageLoad(e.to_string()))?;
        let doc = parse_svg(text).map_err(|e| RenderError::ImageLoad(e.to_string()))?;
        let page = PageBox::of(&doc);
        let path = self.temp_file(".svg", data)?;
        debug!("backend"; "staged {}", path.display());

        Ok(SourceImage::new(page.width, page.height, SourceContent::File(path)))
    }

    fn draw_scaled(
        &self,
        image: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        match image.content() {
            SourceContent::File(path) => self.render_file(path, image.size().0, width, height),
            _ => self.bitmaps.draw_scaled(image, width, height),
        }
    }
}
