//! `[pdf]` section configuration.
//!
//! ```toml
//! [pdf]
//! mode = "vector"         # vector | raster
//! page_size = 600.0       # square page edge in points
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PdfMode {
    /// Redraw SVG primitives as PDF paths.
    #[default]
    Vector,
    /// Embed a rasterized image.
    Raster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub mode: PdfMode,
    pub page_size: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            mode: PdfMode::Vector,
            page_size: 600.0,
        }
    }
}

impl PdfConfig {
    pub const PAGE_SIZE: FieldPath = FieldPath::new("pdf.page_size");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(self.page_size.is_finite() && self.page_size > 0.0) {
            diag.error(Self::PAGE_SIZE, "page size must be a positive number");
        }
    }
}
