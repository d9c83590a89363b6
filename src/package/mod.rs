//! Logo packages: one uploaded SVG in, one zip of variants out.
//!
//! ```text
//! upload ──► SourceDocument ──► Assembler ──► [OutputArtifact] ──► archive ──► zip
//!               │                   │
//!        ExportRequest (JSON)   RenderSurface
//! ```
//!
//! - [`request`]: formats, colors, resolutions and brand name
//! - [`assemble`]: the color x format x resolution cross-product
//! - [`archive`]: zip layout, one folder per format
//! - [`error`]: request-level failures with stable codes

mod archive;
mod assemble;
mod error;
mod request;

pub use archive::archive;
pub use assemble::{Assembler, OutputArtifact};
pub use error::{ErrorResponse, PipelineError};
pub use request::{ExportRequest, FormatTag, ResolutionTag};

use crate::backend::Backend;
use crate::config::ExportConfig;
use crate::logger::ProgressLine;
use crate::raster::{BackendSurface, RenderSurface, ResvgSurface};
use crate::svg::{Document, parse_svg};
use crate::utils::{self, plural_count};
use crate::{debug, log};

/// The uploaded file. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
    pub document: Document,
}

impl SourceDocument {
    /// Accept an upload: it must be non-empty, declared as SVG by MIME type
    /// or extension, and well-formed.
    pub fn load(bytes: &[u8], file_name: &str, mime: &str) -> Result<Self, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::NoFile);
        }
        if !utils::mime::is_svg(mime, file_name) {
            return Err(PipelineError::UnsupportedInput {
                file_name: file_name.to_string(),
                mime: mime.to_string(),
            });
        }
        let text = std::str::from_utf8(bytes).map_err(crate::svg::SvgError::from)?;
        let document = parse_svg(text)?;

        Ok(Self {
            bytes: bytes.to_vec(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            document,
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// A configured export pipeline: backend, render surface and settings.
pub struct Pipeline {
    config: ExportConfig,
    backend: Backend,
    surface: Box<dyn RenderSurface>,
    quiet: bool,
}

impl Pipeline {
    pub fn new(config: ExportConfig) -> Self {
        let backend = Backend::from_config(&config.backend);
        let surface: Box<dyn RenderSurface> = if backend.is_builtin() {
            Box::new(ResvgSurface::new())
        } else {
            Box::new(BackendSurface::new(backend.clone(), config.export.temp_dir()))
        };
        Self {
            config,
            backend,
            surface,
            quiet: false,
        }
    }

    /// Replace the render surface.
    pub fn with_surface(mut self, surface: Box<dyn RenderSurface>) -> Self {
        self.surface = surface;
        self
    }

    /// Hide the progress line.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Backend availability and version.
    pub fn check(&self) -> Result<String, PipelineError> {
        self.backend
            .check()
            .map_err(|e| PipelineError::BackendUnavailable(format!("{e:#}")))
    }

    /// Parse the JSON request with the configured default brand name.
    pub fn parse_request(&self, json: &str) -> Result<ExportRequest, PipelineError> {
        ExportRequest::from_json(json, &self.config.export.brand_name)
    }

    /// Produce every artifact the request asks for.
    pub fn assemble(
        &self,
        source: &SourceDocument,
        request: &ExportRequest,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let progress = create_progress(request, self.quiet);
        let artifacts = Assembler::new(self.surface.as_ref(), &self.config)
            .with_progress(progress.as_ref())
            .assemble(source, request)?;
        if let Some(progress) = progress {
            progress.finish();
        }

        let skipped = request.cell_count() - artifacts.len();
        if skipped > 0 {
            log!("export"; "{} failed, see errors above", plural_count(skipped, "cell"));
        }
        Ok(artifacts)
    }

    /// Upload in, zip out.
    pub fn process_package(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime: &str,
        request_json: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        let version = self.check()?;
        debug!("backend"; "{}", version);

        let source = SourceDocument::load(bytes, file_name, mime)?;
        debug!("export"; "{} ({}, {} bytes)", source.file_name, source.mime, source.bytes.len());
        let request = self.parse_request(request_json)?;
        let artifacts = self.assemble(&source, &request)?;
        archive(&artifacts).map_err(PipelineError::Processing)
    }
}

fn create_progress(request: &ExportRequest, quiet: bool) -> Option<ProgressLine> {
    (!quiet).then(|| ProgressLine::new(&request.cells_per_format()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use zip::ZipArchive;

    use super::*;
    use crate::config::test_parse_config;
    use crate::raster::{RenderError, SourceImage};

    const LOGO: &[u8] =
        br##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><rect width="50" height="50" fill="#ff0000"/></svg>"##;

    fn pipeline() -> Pipeline {
        Pipeline::new(test_parse_config("")).quiet(true)
    }

    #[test]
    fn test_load_rejections() {
        let err = SourceDocument::load(b"", "logo.svg", "image/svg+xml").unwrap_err();
        assert_eq!(err.code(), "NO_FILE");

        let err = SourceDocument::load(b"\x89PNG", "logo.png", "image/png").unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_INPUT");

        let err = SourceDocument::load(b"<svg><g></svg>", "logo.svg", "").unwrap_err();
        assert_eq!(err.code(), "INVALID_SVG");

        // extension alone is enough
        assert!(SourceDocument::load(LOGO, "logo.svg", "application/octet-stream").is_ok());
    }

    #[test]
    fn test_process_package() {
        let zip = pipeline()
            .process_package(
                LOGO,
                "logo.svg",
                "image/svg+xml",
                r#"{"formats":["SVG","PNG","EPS"],"colors":["Original","Black"],"resolutions":["72dpi"],"brandName":"Acme"}"#,
            )
            .unwrap();

        let archive = ZipArchive::new(Cursor::new(zip)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "EPS/",
                "EPS/Acme_Black.eps",
                "EPS/Acme_Original.eps",
                "PNG/",
                "PNG/Acme_Black_72dpi.png",
                "PNG/Acme_Original_72dpi.png",
                "SVG/",
                "SVG/Acme_Black.svg",
                "SVG/Acme_Original.svg",
            ]
        );
    }

    /// Decodes fine, never draws.
    struct BrokenSurface;

    impl RenderSurface for BrokenSurface {
        fn decode(&self, data: &[u8]) -> Result<SourceImage, RenderError> {
            ResvgSurface::new().decode(data)
        }

        fn draw_scaled(
            &self,
            _image: &SourceImage,
            width: u32,
            height: u32,
        ) -> Result<image::RgbaImage, RenderError> {
            Err(RenderError::Surface { width, height })
        }
    }

    #[test]
    fn test_raster_failures_do_not_fail_the_job() {
        let zip = pipeline()
            .with_surface(Box::new(BrokenSurface))
            .process_package(
                LOGO,
                "logo.svg",
                "image/svg+xml",
                r#"{"formats":["PNG","SVG","ICO"],"colors":["Black"],"resolutions":["72dpi"]}"#,
            )
            .unwrap();
        let archive = ZipArchive::new(Cursor::new(zip)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert!(names.contains(&"SVG/Brand_Black.svg"));
        assert!(!names.iter().any(|n| n.starts_with("PNG/") || n.starts_with("ICO/")));
    }

    #[test]
    fn test_process_package_request_errors() {
        let err = pipeline()
            .process_package(LOGO, "logo.svg", "image/svg+xml", r#"{"formats":["PNG"],"colors":["Black"]}"#)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_missing_backend_is_unavailable() {
        let config = test_parse_config(
            "[backend]\nkind = \"inkscape\"\nprogram = \"brandkit-no-such-renderer\"",
        );
        let err = Pipeline::new(config)
            .quiet(true)
            .process_package(LOGO, "logo.svg", "image/svg+xml", r#"{"formats":["SVG"],"colors":["Black"]}"#)
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND_UNAVAILABLE");
        assert_eq!(err.status(), 503);
    }

    #[test]
    fn test_builtin_check_reports_version() {
        assert!(pipeline().check().unwrap().starts_with("resvg "));
    }
}
