//! brandkit - recolored logo packages from a single SVG.

mod backend;
mod cli;
mod color;
mod config;
mod export;
mod logger;
mod package;
mod raster;
mod svg;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ExportConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ExportConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Export { args } => cli::export::run_export(args, &config),
        Commands::Recolor { args } => cli::recolor::run_recolor(args, &config),
        Commands::Doctor => cli::doctor::run_doctor(&config),
    }
}
