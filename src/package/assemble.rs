//! The color x format x resolution cross-product.
//!
//! Every cell is produced independently: a failing cell is logged with its
//! coordinates and left out, and the job carries on with the next one.
//! Only the request deadline aborts the whole run.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::RgbaImage;

use super::request::{ExportRequest, FormatTag, ResolutionTag};
use super::{PipelineError, SourceDocument};
use crate::color::{ColorTag, apply_filter, recolor};
use crate::config::{ExportConfig, PdfMode, RecolorStrategy};
use crate::export::{eps, pdf};
use crate::logger::ProgressLine;
use crate::raster::{
    RenderError, RenderSurface, SourceImage, apply_color, center_on, check_area, encode_ico,
    encode_jpeg, encode_png, fit_within, natural_size, target_size,
};
use crate::svg::Document;
use crate::{debug, log};

/// One file in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub folder: FormatTag,
    pub filename: String,
    pub data: Vec<u8>,
}

impl OutputArtifact {
    /// `FOLDER/filename` inside the archive.
    pub fn path(&self) -> String {
        format!("{}/{}", self.folder.folder(), self.filename)
    }
}

// ============================================================================
// Per-color state
// ============================================================================

/// Everything derived from the source for one color.
///
/// Dropped once all formats for the color are done, which also removes any
/// staged temp file held by the decoded image.
struct ColorVariant {
    tag: ColorTag,
    /// Paint attributes rewritten; feeds EPS and vector PDF.
    rewritten: Document,
    /// Serialized flattened variant; feeds SVG output and PNG/JPG.
    text: String,
    image: Option<SourceImage>,
}

impl ColorVariant {
    fn new(source: &SourceDocument, tag: &ColorTag, strategy: RecolorStrategy) -> Self {
        if let ColorTag::Unrecognized(raw) = tag {
            debug!("color"; "unrecognized color mode `{}`, colors left unchanged", raw);
        }
        let rewritten = recolor(&source.document, tag);
        let text = match strategy {
            RecolorStrategy::Rewrite => rewritten.to_svg_string(),
            RecolorStrategy::Filter => apply_filter(&source.document, tag).to_svg_string(),
        };
        Self {
            tag: tag.clone(),
            rewritten,
            text,
            image: None,
        }
    }

    /// SVG bytes for this variant; `Original` passes the upload through.
    fn svg_bytes<'a>(&'a self, source: &'a SourceDocument) -> &'a [u8] {
        if self.tag == ColorTag::Original {
            &source.bytes
        } else {
            self.text.as_bytes()
        }
    }

    fn image(
        &mut self,
        source: &SourceDocument,
        surface: &dyn RenderSurface,
    ) -> Result<&SourceImage> {
        if self.image.is_none() {
            let decoded = surface
                .decode(self.svg_bytes(source))
                .context("Failed to load colored variant")?;
            self.image = Some(decoded);
        }
        self.image.as_ref().context("colored variant not loaded")
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Produces every artifact of one request.
pub struct Assembler<'a> {
    surface: &'a dyn RenderSurface,
    config: &'a ExportConfig,
    progress: Option<&'a ProgressLine>,
    timeout: Duration,
}

impl<'a> Assembler<'a> {
    pub fn new(surface: &'a dyn RenderSurface, config: &'a ExportConfig) -> Self {
        Self {
            surface,
            config,
            progress: None,
            timeout: config.export.timeout(),
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressLine>) -> Self {
        self.progress = progress;
        self
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the cross-product: colors in request order, then formats, then
    /// resolutions for PNG/JPG.
    pub fn assemble(
        &self,
        source: &SourceDocument,
        request: &ExportRequest,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let deadline = Instant::now() + self.timeout;
        let strategy = self.config.recolor.strategy;
        let mut uncolored: Option<SourceImage> = None;
        let mut artifacts = Vec::with_capacity(request.cell_count());

        for tag in &request.colors {
            let mut variant = ColorVariant::new(source, tag, strategy);

            for &format in &request.formats {
                for resolution in request.resolutions_for(format) {
                    if Instant::now() >= deadline {
                        return Err(PipelineError::Timeout(self.timeout));
                    }

                    match self.render_cell(source, &mut variant, &mut uncolored, format, resolution)
                    {
                        Ok(data) => artifacts.push(OutputArtifact {
                            folder: format,
                            filename: request.file_name(tag, format, resolution),
                            data,
                        }),
                        Err(e) => log!(
                            "error";
                            "format={} color={} resolution={}: {:#}",
                            format,
                            tag.label(),
                            resolution.map_or("-", ResolutionTag::label),
                            e
                        ),
                    }

                    if let Some(progress) = self.progress {
                        progress.inc(format.extension());
                    }
                }
            }
        }

        Ok(artifacts)
    }

    fn render_cell(
        &self,
        source: &SourceDocument,
        variant: &mut ColorVariant,
        uncolored: &mut Option<SourceImage>,
        format: FormatTag,
        resolution: Option<ResolutionTag>,
    ) -> Result<Vec<u8>> {
        let raster = &self.config.raster;
        match format {
            FormatTag::Svg => Ok(variant.svg_bytes(source).to_vec()),
            FormatTag::Png | FormatTag::Jpg => {
                let dpi = resolution.map_or(72, ResolutionTag::dpi);
                let image = variant.image(source, self.surface)?;
                let (width, height) = target_size(image.size(), dpi);
                let pixels = self.draw(image, width, height)?;
                if format == FormatTag::Png {
                    encode_png(&pixels)
                } else {
                    encode_jpeg(&pixels, raster.jpeg_quality, raster.background_rgb())
                }
            }
            FormatTag::Ico => {
                let size = raster.ico_size;
                let base = self.uncolored(source, uncolored)?;
                let (width, height) = fit_within(base.size(), (size, size));
                let pixels = apply_color(self.draw(base, width, height)?, &variant.tag);
                encode_ico(&center_on(&pixels, size, size), size)
            }
            FormatTag::Pdf => {
                let page_size = self.config.pdf.page_size;
                match self.config.pdf.mode {
                    PdfMode::Vector => Ok(pdf::to_pdf(&variant.rewritten, page_size)),
                    PdfMode::Raster => {
                        let drawn = self
                            .uncolored(source, uncolored)
                            .and_then(|base| {
                                let (width, height) = natural_size(base);
                                Ok(self.draw(base, width, height)?)
                            });
                        Ok(match drawn {
                            Ok(pixels) => {
                                pdf::raster_to_pdf(&apply_color(pixels, &variant.tag), page_size)
                            }
                            Err(e) => {
                                log!("pdf"; "rasterizing failed ({:#}), using fallback", e);
                                pdf::fallback("raster conversion failed", page_size)
                            }
                        })
                    }
                }
            }
            FormatTag::Eps => Ok(eps::to_eps(&variant.rewritten, &variant.tag).into_bytes()),
        }
    }

    /// Draw through the surface, within the configured pixel budget.
    fn draw(&self, image: &SourceImage, width: u32, height: u32) -> Result<RgbaImage, RenderError> {
        check_area(width, height, self.config.raster.max_pixels)?;
        self.surface.draw_scaled(image, width, height)
    }

    /// The source decoded once per job, without any color applied.
    fn uncolored<'s>(
        &self,
        source: &SourceDocument,
        slot: &'s mut Option<SourceImage>,
    ) -> Result<&'s SourceImage> {
        if slot.is_none() {
            let decoded = self
                .surface
                .decode(&source.bytes)
                .context("Failed to load source image")?;
            *slot = Some(decoded);
        }
        slot.as_ref().context("source image not loaded")
    }
}
