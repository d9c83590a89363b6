//! Rasterization backends.
//!
//! | Backend    | Program    | Export types          |
//! |------------|------------|-----------------------|
//! | `builtin`  | (resvg)    | svg, png              |
//! | `inkscape` | `inkscape` | svg, png, pdf, eps    |
//! | `magick`   | `magick`   | png, pdf, eps         |
//!
//! The builtin backend is always available. External backends are checked
//! with [`Backend::check`] before a job is accepted.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use thiserror::Error;

use crate::config::{BackendConfig, BackendKind};
use crate::debug;
use crate::utils::exec::{Cmd, INKSCAPE_FILTER};

/// Version of the bundled renderer, reported by `brandkit doctor`.
const RESVG_VERSION: &str = "0.45";

/// Output type requested from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Svg,
    Png,
    Pdf,
    Eps,
}

impl ExportType {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Eps => "eps",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("render backend `{program}` is not installed")]
    Unavailable { program: String },

    #[error("backend `{backend}` cannot export {export_type}")]
    Unsupported {
        backend: &'static str,
        export_type: ExportType,
    },

    #[error("backend `{backend}` failed")]
    Failed {
        backend: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// A configured render backend.
#[derive(Debug, Clone)]
pub struct Backend {
    kind: BackendKind,
    program: Option<String>,
    timeout: Duration,
}

impl Backend {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            kind: config.kind,
            program: config.program(),
            timeout: config.timeout(),
        }
    }

    /// The in-process resvg backend.
    pub fn builtin() -> Self {
        Self {
            kind: BackendKind::Builtin,
            program: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_builtin(&self) -> bool {
        self.kind == BackendKind::Builtin
    }

    /// Verify the backend can be invoked and report its version string.
    pub fn check(&self) -> Result<String, BackendError> {
        let Some(program) = &self.program else {
            return Ok(format!("resvg {RESVG_VERSION}"));
        };

        let path = which::which(program).map_err(|_| BackendError::Unavailable {
            program: program.clone(),
        })?;
        debug!("backend"; "{} resolved to {}", program, path.display());

        let version_flag = match self.kind {
            BackendKind::Magick => "-version",
            _ => "--version",
        };
        let output = Cmd::new(&path)
            .arg(version_flag)
            .timeout(self.timeout)
            .filter(&INKSCAPE_FILTER)
            .run()
            .map_err(|source| self.failed(source))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(self.kind.name());
        Ok(version.to_string())
    }

    /// Render `input` (an SVG file) to `output`.
    ///
    /// `dpi` is only meaningful for raster output. Inkscape exports the
    /// drawing area rather than the page.
    pub fn render(
        &self,
        input: &Path,
        export_type: ExportType,
        dpi: Option<f32>,
        output: &Path,
    ) -> Result<(), BackendError> {
        debug!("backend"; "{} {} -> {} ({:?} dpi)", self.kind.name(), input.display(), export_type, dpi);
        match (self.kind, &self.program) {
            (BackendKind::Builtin, _) | (_, None) => self.render_builtin(input, export_type, dpi, output),
            (BackendKind::Inkscape, Some(program)) => {
                let mut cmd = Cmd::new(program)
                    .arg(input)
                    .arg(format!("--export-type={export_type}"));
                if let Some(dpi) = dpi {
                    cmd = cmd.arg(format!("--export-dpi={dpi}"));
                }
                cmd.arg("--export-area-drawing")
                    .arg(format!("--export-filename={}", output.display()))
                    .timeout(self.timeout)
                    .filter(&INKSCAPE_FILTER)
                    .run()
                    .map(drop)
                    .map_err(|source| self.failed(source))
            }
            (BackendKind::Magick, Some(program)) => {
                if export_type == ExportType::Svg {
                    return Err(self.unsupported(export_type));
                }
                let mut cmd = Cmd::new(program).args(["-background", "none"]);
                if let Some(dpi) = dpi {
                    cmd = cmd.args(["-density".to_string(), dpi.to_string()]);
                }
                cmd.arg(input)
                    .arg(output)
                    .timeout(self.timeout)
                    .run()
                    .map(drop)
                    .map_err(|source| self.failed(source))
            }
        }
    }

    fn render_builtin(
        &self,
        input: &Path,
        export_type: ExportType,
        dpi: Option<f32>,
        output: &Path,
    ) -> Result<(), BackendError> {
        let result = match export_type {
            ExportType::Svg => fs::copy(input, output)
                .map(drop)
                .with_context(|| format!("Failed to copy {}", input.display())),
            ExportType::Png => render_png_file(input, dpi.unwrap_or(96.0), output),
            ExportType::Pdf | ExportType::Eps => return Err(self.unsupported(export_type)),
        };
        result.map_err(|source| self.failed(source))
    }

    fn failed(&self, source: anyhow::Error) -> BackendError {
        BackendError::Failed {
            backend: self.kind.name(),
            source,
        }
    }

    fn unsupported(&self, export_type: ExportType) -> BackendError {
        BackendError::Unsupported {
            backend: self.kind.name(),
            export_type,
        }
    }
}

/// Rasterize an SVG file with resvg at `dpi` (96 = natural CSS pixel size).
fn render_png_file(input: &Path, dpi: f32, output: &Path) -> anyhow::Result<()> {
    use crate::raster::{RenderSurface, ResvgSurface, encode_png};

    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let surface = ResvgSurface::new();
    let image = surface.decode(&data)?;
    let (width, height) = image.size();
    let scale = f64::from(dpi) / 96.0;
    let pixels = surface.draw_scaled(
        &image,
        ((width * scale).round() as u32).max(1),
        ((height * scale).round() as u32).max(1),
    )?;
    let png = encode_png(&pixels)?;
    fs::write(output, png).with_context(|| format!("Failed to write {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_always_available() {
        let version = Backend::builtin().check().unwrap();
        assert!(version.starts_with("resvg "));
    }

    #[test]
    fn test_missing_program_unavailable() {
        let config = BackendConfig {
            kind: BackendKind::Inkscape,
            program: "brandkit-no-such-inkscape".to_string(),
            ..Default::default()
        };
        let err = Backend::from_config(&config).check().unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
    }

    #[test]
    fn test_builtin_renders_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("logo.svg");
        let output = dir.path().join("logo.png");
        fs::write(
            &input,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"><rect width="10" height="20" fill="#ff0000"/></svg>"##,
        )
        .unwrap();

        Backend::builtin()
            .render(&input, ExportType::Png, Some(192.0), &output)
            .unwrap();
        let png = image::open(&output).unwrap().to_rgba8();
        assert_eq!(png.dimensions(), (20, 40));
        assert_eq!(png.get_pixel(5, 5).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_builtin_rejects_vector_export() {
        let dir = tempfile::tempdir().unwrap();
        let err = Backend::builtin()
            .render(&dir.path().join("a.svg"), ExportType::Eps, None, &dir.path().join("a.eps"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Unsupported { .. }));
    }
}
