//! Command-line interface module.

mod args;
pub mod doctor;
pub mod export;
pub mod recolor;

pub use args::{Cli, Commands, ExportArgs, RecolorArgs};
