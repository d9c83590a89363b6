//! `[backend]` section configuration.
//!
//! Selects how SVGs are rasterized.
//!
//! # Example
//!
//! ```toml
//! [backend]
//! kind = "builtin"        # builtin | inkscape | magick
//! program = ""            # override the executable (path or name)
//! timeout_secs = 60       # per-invocation limit for external backends
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Rasterization backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// resvg, in process.
    #[default]
    Builtin,
    /// `inkscape` command.
    Inkscape,
    /// ImageMagick (`magick` command).
    Magick,
}

impl BackendKind {
    /// Executable name for external backends.
    pub const fn default_program(self) -> Option<&'static str> {
        match self {
            Self::Builtin => None,
            Self::Inkscape => Some("inkscape"),
            Self::Magick => Some("magick"),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Inkscape => "inkscape",
            Self::Magick => "magick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Builtin,
            program: String::new(),
            timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub const KIND: FieldPath = FieldPath::new("backend.kind");
    pub const PROGRAM: FieldPath = FieldPath::new("backend.program");
    pub const TIMEOUT_SECS: FieldPath = FieldPath::new("backend.timeout_secs");

    /// Executable to run: the override when set, else the kind's default.
    /// `None` for the builtin backend.
    pub fn program(&self) -> Option<String> {
        let default = self.kind.default_program()?;
        if self.program.trim().is_empty() {
            Some(default.to_string())
        } else {
            Some(self.program.trim().to_string())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate backend configuration.
    ///
    /// # Checks
    /// - An external backend's executable must be installed.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout_secs == 0 {
            diag.error(Self::TIMEOUT_SECS, "timeout must be at least 1 second");
        }

        let Some(program) = self.program() else {
            return;
        };
        if which::which(&program).is_err() {
            let field = if self.program.trim().is_empty() {
                Self::KIND
            } else {
                Self::PROGRAM
            };
            diag.error_with_hint(
                field,
                format!("`{program}` command not found"),
                format!(
                    "install {} or set {} = \"builtin\"",
                    self.kind.name(),
                    Self::KIND
                ),
            );
        }
    }
}
