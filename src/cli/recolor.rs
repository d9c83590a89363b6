//! Recolor command implementation.

use std::fs;
use std::io::{Write, stdout};

use anyhow::{Context, Result};

use crate::cli::args::RecolorArgs;
use crate::color::{ColorTag, apply_filter, recolor};
use crate::config::{ExportConfig, RecolorStrategy};
use crate::package::SourceDocument;
use crate::utils::mime;
use crate::{debug, log};

/// Execute recolor command
pub fn run_recolor(args: &RecolorArgs, config: &ExportConfig) -> Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let file_name = args.input.to_string_lossy();
    let source = SourceDocument::load(&bytes, &file_name, mime::from_path(&args.input))
        .with_context(|| format!("Cannot recolor {}", args.input.display()))?;

    let tag = ColorTag::parse(&args.color);
    let strategy = args.strategy.unwrap_or(config.recolor.strategy);
    let svg = recolor_svg(&source, &tag, strategy);

    match &args.output {
        Some(path) => {
            fs::write(path, &svg).with_context(|| format!("Failed to write {}", path.display()))?;
            log!("recolor"; "{} -> {}", tag.label(), path.display());
        }
        None => {
            let mut out = stdout().lock();
            out.write_all(&svg).context("Failed to write to stdout")?;
            out.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn recolor_svg(source: &SourceDocument, tag: &ColorTag, strategy: RecolorStrategy) -> Vec<u8> {
    if let ColorTag::Unrecognized(raw) = tag {
        debug!("color"; "unrecognized color mode `{}`, colors left unchanged", raw);
    }
    match (tag, strategy) {
        (ColorTag::Original, _) => source.bytes.clone(),
        (_, RecolorStrategy::Rewrite) => recolor(&source.document, tag).to_svg_string().into_bytes(),
        (_, RecolorStrategy::Filter) => {
            apply_filter(&source.document, tag).to_svg_string().into_bytes()
        }
    }
}
