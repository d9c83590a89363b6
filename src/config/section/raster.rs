//! `[raster]` section configuration.
//!
//! ```toml
//! [raster]
//! jpeg_quality = 90       # 1..=100
//! ico_size = 32           # ICO edge in pixels
//! background = "#ffffff"  # JPG has no alpha; transparent pixels land on this
//! max_pixels = 64000000   # largest surface drawn for one file
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub jpeg_quality: u8,
    pub ico_size: u32,
    pub background: String,
    /// Cells needing a larger pixel surface fail instead of allocating it.
    pub max_pixels: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            ico_size: 32,
            background: "#ffffff".to_string(),
            max_pixels: 64_000_000,
        }
    }
}

impl RasterConfig {
    pub const JPEG_QUALITY: FieldPath = FieldPath::new("raster.jpeg_quality");
    pub const ICO_SIZE: FieldPath = FieldPath::new("raster.ico_size");
    pub const BACKGROUND: FieldPath = FieldPath::new("raster.background");
    pub const MAX_PIXELS: FieldPath = FieldPath::new("raster.max_pixels");

    /// Parsed JPG background; white when the value is invalid.
    pub fn background_rgb(&self) -> Rgb {
        Rgb::from_hex(&self.background).unwrap_or(Rgb::WHITE)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error(Self::JPEG_QUALITY, "quality must be between 1 and 100");
        }
        if self.ico_size == 0 || self.ico_size > 256 {
            diag.error_with_hint(
                Self::ICO_SIZE,
                format!("invalid icon size {}", self.ico_size),
                "icons are between 1 and 256 pixels wide",
            );
        }
        if Rgb::from_hex(&self.background).is_none() {
            diag.error_with_hint(
                Self::BACKGROUND,
                format!("`{}` is not a hex color", self.background),
                "use #rrggbb or #rgb",
            );
        }
        // the largest icon must still fit
        if self.max_pixels < 256 * 256 {
            diag.error(Self::MAX_PIXELS, "pixel limit must be at least 65536");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.raster.jpeg_quality, 90);
        assert_eq!(config.raster.ico_size, 32);
        assert_eq!(config.raster.background_rgb(), Rgb::WHITE);
        assert_eq!(config.raster.max_pixels, 64_000_000);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let config = test_parse_config(
            "[raster]\njpeg_quality = 0\nico_size = 0\nbackground = \"white-ish\"\nmax_pixels = 10",
        );
        let mut diag = ConfigDiagnostics::new();
        config.raster.validate(&mut diag);
        assert_eq!(diag.len(), 4);
    }
}
