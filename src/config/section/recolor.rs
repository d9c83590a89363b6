//! `[recolor]` section configuration.
//!
//! ```toml
//! [recolor]
//! strategy = "rewrite"    # rewrite | filter
//! ```
//!
//! - `rewrite`: set `fill`/`stroke` on every element
//! - `filter`: wrap the drawing in a `feColorMatrix` filter group
//!
//! EPS and PDF always draw from the rewritten document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecolorStrategy {
    #[default]
    Rewrite,
    Filter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecolorConfig {
    pub strategy: RecolorStrategy,
}
