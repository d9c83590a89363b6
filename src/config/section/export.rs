//! `[export]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [export]
//! brand_name = "Acme"     # default file-name prefix (default: "Brand")
//! temp_dir = ""           # empty: system temp dir
//! timeout_secs = 300      # whole-job deadline
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Brand name used when a request does not carry one.
    pub brand_name: String,

    /// Directory for per-color intermediate files of external backends.
    pub temp_dir: PathBuf,

    /// Deadline for one export job, in seconds.
    pub timeout_secs: u64,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            brand_name: "Brand".to_string(),
            temp_dir: PathBuf::new(),
            timeout_secs: 300,
        }
    }
}

impl ExportSection {
    pub const BRAND_NAME: FieldPath = FieldPath::new("export.brand_name");
    pub const TEMP_DIR: FieldPath = FieldPath::new("export.temp_dir");
    pub const TIMEOUT_SECS: FieldPath = FieldPath::new("export.timeout_secs");

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured temp dir, or the system one when empty.
    pub fn temp_dir(&self) -> PathBuf {
        if self.temp_dir.as_os_str().is_empty() {
            std::env::temp_dir()
        } else {
            self.temp_dir.clone()
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if crate::utils::sanitize_file_component(&self.brand_name).is_empty() {
            diag.error(Self::BRAND_NAME, "brand name is empty after sanitizing");
        }
        if self.timeout_secs == 0 {
            diag.error(Self::TIMEOUT_SECS, "timeout must be at least 1 second");
        }
        if !self.temp_dir.as_os_str().is_empty() && !self.temp_dir.is_dir() {
            diag.error_with_hint(
                Self::TEMP_DIR,
                format!("`{}` is not a directory", self.temp_dir.display()),
                "create it or leave the field empty for the system temp dir",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.export.brand_name, "Brand");
        assert_eq!(config.export.timeout_secs, 300);
        assert_eq!(config.export.temp_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_custom_values() {
        let config = test_parse_config("[export]\nbrand_name = \"Acme\"\ntimeout_secs = 5");
        assert_eq!(config.export.brand_name, "Acme");
        assert_eq!(config.export.timeout().as_secs(), 5);
    }
}
