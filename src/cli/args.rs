//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RecolorStrategy;

/// Export recolored logo packages from a single SVG
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: brandkit.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Export a zip package of color and format variants
    #[command(visible_alias = "e")]
    Export {
        #[command(flatten)]
        args: ExportArgs,
    },

    /// Write one recolored SVG
    #[command(visible_alias = "r")]
    Recolor {
        #[command(flatten)]
        args: RecolorArgs,
    },

    /// Check that the render backend is installed
    #[command(visible_alias = "d")]
    Doctor,
}

/// Export command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Source SVG
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output zip (default: <input stem>.zip, `-` for stdout)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Formats to export (svg, png, jpg, pdf, eps, ico)
    #[arg(short, long, value_delimiter = ',', default_value = "svg,png,jpg,pdf,eps,ico")]
    pub formats: Vec<String>,

    /// Colors: original, black, white, grayscale, inverted or #rrggbb
    #[arg(short, long, value_delimiter = ',', default_value = "original")]
    pub colors: Vec<String>,

    /// Resolutions for PNG and JPG (72dpi, 150dpi, 300dpi)
    #[arg(short, long, value_delimiter = ',', default_value = "72dpi")]
    pub resolutions: Vec<String>,

    /// Brand name used in file names (default: export.brand_name)
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Read the whole request from a JSON file instead of the flags above
    #[arg(long, value_hint = clap::ValueHint::FilePath, conflicts_with_all = ["formats", "colors", "resolutions", "brand"])]
    pub request: Option<PathBuf>,

    /// Declared MIME type of the input (default: guessed from the extension)
    #[arg(long)]
    pub mime: Option<String>,

    /// Print failures as a JSON error response on stdout
    #[arg(long)]
    pub json: bool,
}

/// Recolor command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RecolorArgs {
    /// Source SVG
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Target color: original, black, white, grayscale, inverted or #rrggbb
    #[arg(short, long)]
    pub color: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Override recolor.strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<RecolorStrategy>,
}
