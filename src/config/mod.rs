//! Export configuration management for `brandkit.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── export     # [export]
//! │   ├── backend    # [backend]
//! │   ├── recolor    # [recolor]
//! │   ├── raster     # [raster]
//! │   └── pdf        # [pdf]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # ExportConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[export]`  | Default brand name, temp dir, job deadline     |
//! | `[backend]` | builtin / inkscape / magick rasterizer         |
//! | `[recolor]` | rewrite or filter recoloring                   |
//! | `[raster]`  | JPG quality and background, ICO size           |
//! | `[pdf]`     | vector or raster PDF, page size                |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BackendConfig, BackendKind, ExportSection, PdfConfig, PdfMode, RasterConfig, RecolorConfig,
    RecolorStrategy,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{debug, log};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "brandkit.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing brandkit.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Absolute path to the config file; empty when running on defaults.
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub export: ExportSection,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub recolor: RecolorConfig,

    #[serde(default)]
    pub raster: RasterConfig,

    #[serde(default)]
    pub pdf: PdfConfig,
}

impl ExportConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `brandkit.toml` is searched
    /// upward from the cwd and defaults apply when none is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::Validation(format!(
                        "config file `{}` not found",
                        path.display()
                    ))
                    .into());
                }
                Some(path.to_path_buf())
            }
            None => find_config_file(Path::new(CONFIG_FILE)),
        };

        let config = match path {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "no {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Validate every section.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.export.validate(&mut diag);
        self.backend.validate(&mut diag);
        self.raster.validate(&mut diag);
        self.pdf.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ExportConfig {
    let (parsed, ignored) = ExportConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
