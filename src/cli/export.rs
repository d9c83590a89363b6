//! Export command implementation.

use std::fs;
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::args::ExportArgs;
use crate::config::ExportConfig;
use crate::log;
use crate::package::{Pipeline, PipelineError};
use crate::utils::mime;

/// Execute export command
pub fn run_export(args: &ExportArgs, config: &ExportConfig) -> Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let file_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = args
        .mime
        .clone()
        .unwrap_or_else(|| mime::from_path(&args.input).to_string());
    let request = request_json(args)?;

    let pipeline = Pipeline::new(config.clone());
    match pipeline.process_package(&bytes, &file_name, &mime, &request) {
        Ok(zip) => write_output(&output_path(args), &zip),
        Err(e) => fail(&e, args.json),
    }
}

/// The request body: `--request` verbatim, or built from the flags.
fn request_json(args: &ExportArgs) -> Result<String> {
    if let Some(path) = &args.request {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()));
    }
    let request = json!({
        "formats": args.formats,
        "colors": args.colors,
        "resolutions": args.resolutions,
        "brandName": args.brand,
    });
    Ok(request.to_string())
}

fn output_path(args: &ExportArgs) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map_or_else(|| "brandkit".into(), |s| s.to_string_lossy());
        PathBuf::from(format!("{stem}.zip"))
    })
}

fn write_output(path: &Path, zip: &[u8]) -> Result<()> {
    if path.as_os_str() == "-" {
        let mut out = stdout().lock();
        out.write_all(zip).context("Failed to write archive to stdout")?;
        return out.flush().context("Failed to write archive to stdout");
    }
    fs::write(path, zip).with_context(|| format!("Failed to write {}", path.display()))?;
    log!("export"; "wrote {} ({} bytes)", path.display(), zip.len());
    Ok(())
}

/// Report a failed job and exit non-zero.
fn fail(err: &PipelineError, json: bool) -> ! {
    if json {
        let response = err.to_response();
        match serde_json::to_string(&response) {
            Ok(text) => println!("{text}"),
            Err(e) => log!("error"; "failed to serialize error response: {}", e),
        }
    } else {
        log!("error"; "{} ({}): {}", err.code(), err.status(), err);
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn export_args(argv: &[&str]) -> ExportArgs {
        let cli = Cli::parse_from(argv.iter().copied());
        match cli.command {
            Commands::Export { args } => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_request_from_flags() {
        let args = export_args(&[
            "brandkit", "export", "logo.svg", "-f", "svg,png", "-c", "black,#ff8800", "-b", "Acme",
        ]);
        let json: serde_json::Value = serde_json::from_str(&request_json(&args).unwrap()).unwrap();
        assert_eq!(json["formats"], json!(["svg", "png"]));
        assert_eq!(json["colors"], json!(["black", "#ff8800"]));
        assert_eq!(json["resolutions"], json!(["72dpi"]));
        assert_eq!(json["brandName"], "Acme");
    }

    #[test]
    fn test_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        fs::write(&path, r#"{"formats":["EPS"],"colors":["White"]}"#).unwrap();
        let args = export_args(&["brandkit", "e", "logo.svg", "--request", path.to_str().unwrap()]);
        assert_eq!(request_json(&args).unwrap(), r#"{"formats":["EPS"],"colors":["White"]}"#);
    }

    #[test]
    fn test_default_output_path() {
        let args = export_args(&["brandkit", "export", "art/logo.svg"]);
        assert_eq!(output_path(&args), PathBuf::from("logo.zip"));
        let args = export_args(&["brandkit", "export", "logo.svg", "-o", "-"]);
        assert_eq!(output_path(&args), PathBuf::from("-"));
    }

    #[test]
    fn test_write_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.zip");
        write_output(&path, b"PK").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"PK");
    }
}
