//! Request-level failures and their structured form.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::svg::SvgError;

/// Everything that aborts a whole export job.
///
/// Failures inside one (color, format, resolution) cell never show up here;
/// they are logged and the cell is skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no file was uploaded")]
    NoFile,

    #[error("invalid SVG: {0}")]
    InvalidSvg(#[from] SvgError),

    #[error("unsupported input `{file_name}` ({mime}), only SVG is accepted")]
    UnsupportedInput { file_name: String, mime: String },

    #[error("invalid export request: {0}")]
    InvalidRequest(String),

    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("export did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("processing failed: {0:#}")]
    Processing(#[source] anyhow::Error),
}

impl PipelineError {
    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoFile => "NO_FILE",
            Self::InvalidSvg(_) => "INVALID_SVG",
            Self::UnsupportedInput { .. } => "UNSUPPORTED_INPUT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Processing(_) => "PROCESSING_ERROR",
        }
    }

    /// HTTP-style status.
    pub const fn status(&self) -> u16 {
        match self {
            Self::NoFile | Self::InvalidRequest(_) => 400,
            Self::UnsupportedInput { .. } => 415,
            Self::InvalidSvg(_) => 422,
            Self::Processing(_) => 500,
            Self::BackendUnavailable(_) => 503,
            Self::Timeout(_) => 504,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.code(),
            status: self.status(),
            message: self.to_string(),
        }
    }
}

/// Serialized failure, printed by `export --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub status: u16,
    pub message: String,
}
