//! Export request: which formats, colors and resolutions to produce.

use std::fmt;

use serde::Deserialize;

use super::PipelineError;
use crate::color::ColorTag;
use crate::utils::sanitize_file_component;

// ============================================================================
// Tags
// ============================================================================

/// Output format; each one is a top-level folder in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FormatTag {
    Svg,
    Png,
    Jpg,
    Pdf,
    Eps,
    Ico,
}

impl FormatTag {
    /// Case-insensitive; `jpeg` is accepted for JPG.
    pub fn parse(value: &str) -> Option<Self> {
        let tag = match value.trim().to_ascii_lowercase().as_str() {
            "svg" => Self::Svg,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpg,
            "pdf" => Self::Pdf,
            "eps" => Self::Eps,
            "ico" => Self::Ico,
            _ => return None,
        };
        Some(tag)
    }

    /// Archive folder name.
    pub const fn folder(self) -> &'static str {
        match self {
            Self::Svg => "SVG",
            Self::Png => "PNG",
            Self::Jpg => "JPG",
            Self::Pdf => "PDF",
            Self::Eps => "EPS",
            Self::Ico => "ICO",
        }
    }

    /// Lowercase file extension, also the progress counter name.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Pdf => "pdf",
            Self::Eps => "eps",
            Self::Ico => "ico",
        }
    }

    /// PNG and JPG produce one artifact per requested resolution.
    pub const fn uses_resolutions(self) -> bool {
        matches!(self, Self::Png | Self::Jpg)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

impl TryFrom<String> for FormatTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown format `{value}`"))
    }
}

/// Raster output density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ResolutionTag {
    Dpi72,
    Dpi150,
    Dpi300,
}

impl ResolutionTag {
    /// Accepts `72dpi` or a bare `72`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_ascii_lowercase();
        let number = lower.strip_suffix("dpi").unwrap_or(&lower).trim();
        let tag = match number {
            "72" => Self::Dpi72,
            "150" => Self::Dpi150,
            "300" => Self::Dpi300,
            _ => return None,
        };
        Some(tag)
    }

    pub const fn dpi(self) -> u32 {
        match self {
            Self::Dpi72 => 72,
            Self::Dpi150 => 150,
            Self::Dpi300 => 300,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dpi72 => "72dpi",
            Self::Dpi150 => "150dpi",
            Self::Dpi300 => "300dpi",
        }
    }
}

impl fmt::Display for ResolutionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for ResolutionTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown resolution `{value}`"))
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    formats: Vec<FormatTag>,
    #[serde(default)]
    colors: Vec<ColorTag>,
    #[serde(default)]
    resolutions: Vec<ResolutionTag>,
    #[serde(default)]
    brand_name: Option<String>,
}

/// A validated export request.
///
/// Formats are a set kept in first-seen order, colors keep request order,
/// and the brand name is safe to use in file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub formats: Vec<FormatTag>,
    pub colors: Vec<ColorTag>,
    pub resolutions: Vec<ResolutionTag>,
    pub brand_name: String,
}

impl ExportRequest {
    /// Parse the JSON request body.
    pub fn from_json(json: &str, default_brand: &str) -> Result<Self, PipelineError> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
        Self::new(
            raw.formats,
            raw.colors,
            raw.resolutions,
            raw.brand_name.as_deref(),
            default_brand,
        )
    }

    /// Validate and normalize request parts.
    pub fn new(
        formats: Vec<FormatTag>,
        colors: Vec<ColorTag>,
        resolutions: Vec<ResolutionTag>,
        brand_name: Option<&str>,
        default_brand: &str,
    ) -> Result<Self, PipelineError> {
        let formats = dedup(formats);
        let resolutions = dedup(resolutions);

        if formats.is_empty() {
            return Err(PipelineError::InvalidRequest("no formats requested".into()));
        }
        if colors.is_empty() {
            return Err(PipelineError::InvalidRequest("no colors requested".into()));
        }
        if resolutions.is_empty()
            && let Some(format) = formats.iter().find(|f| f.uses_resolutions())
        {
            return Err(PipelineError::InvalidRequest(format!(
                "{format} requested without any resolution"
            )));
        }

        let brand_name = brand_name
            .map(sanitize_file_component)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sanitize_file_component(default_brand));

        Ok(Self {
            formats,
            colors,
            resolutions,
            brand_name,
        })
    }

    /// Resolutions a format is produced at; `[None]` for single-size formats.
    pub fn resolutions_for(&self, format: FormatTag) -> Vec<Option<ResolutionTag>> {
        if format.uses_resolutions() {
            self.resolutions.iter().copied().map(Some).collect()
        } else {
            vec![None]
        }
    }

    /// Number of cells per format, for progress display.
    pub fn cells_per_format(&self) -> Vec<(&'static str, usize)> {
        self.formats
            .iter()
            .map(|&f| (f.extension(), self.colors.len() * self.resolutions_for(f).len()))
            .collect()
    }

    /// Upper bound on the number of artifacts.
    pub fn cell_count(&self) -> usize {
        self.cells_per_format().iter().map(|(_, n)| n).sum()
    }

    /// `${brand}_${color}[_${resolution}].${ext}`
    pub fn file_name(
        &self,
        color: &ColorTag,
        format: FormatTag,
        resolution: Option<ResolutionTag>,
    ) -> String {
        match resolution {
            Some(res) => format!(
                "{}_{}_{}.{}",
                self.brand_name,
                color.label(),
                res.label(),
                format.extension()
            ),
            None => format!(
                "{}_{}.{}",
                self.brand_name,
                color.label(),
                format.extension()
            ),
        }
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
