use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lumen_core::MetadataOverrides;
use lumen_io::{ConversionManager, ConversionMetadata, Format};
use serde::Serialize;
use tracing::info;

use crate::commands::util::{print_json, read_input, source_format};

#[derive(Debug, Serialize)]
struct ConvertReport<'a> {
    input: &'a Path,
    output: &'a Path,
    metadata: &'a ConversionMetadata,
    warnings: Vec<String>,
}

pub struct ConvertArgs<'a> {
    pub input: &'a Path,
    pub to: Format,
    pub from: Option<Format>,
    pub output: Option<&'a Path>,
    pub strict: bool,
    pub json: bool,
    pub overrides: MetadataOverrides,
}

/// Input path with the target's extension.
pub fn default_output(input: &Path, to: Format) -> PathBuf {
    input.with_extension(to.default_extension())
}

pub fn handle(manager: &ConversionManager, args: ConvertArgs<'_>) -> Result<()> {
    let output_path = args
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(args.input, args.to));
    if output_path == args.input {
        bail!(
            "output '{}' would overwrite the input; pass -o",
            output_path.display()
        );
    }

    let bytes = read_input(args.input)?;
    let from = source_format(manager, &bytes, args.from)?;
    let output = manager.convert_with_overrides(&bytes, from, args.to, &args.overrides)?;
    let warnings = output.warnings();

    if args.strict && !warnings.is_empty() {
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }
        bail!(
            "{} warning(s) in strict mode; nothing written",
            warnings.len()
        );
    }

    fs::write(&output_path, &output.bytes)
        .with_context(|| format!("writing '{}'", output_path.display()))?;
    info!(output = %output_path.display(), bytes = output.bytes.len(), "wrote output");

    if args.json {
        return print_json(&ConvertReport {
            input: args.input,
            output: &output_path,
            metadata: &output.metadata,
            warnings,
        });
    }
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "Converted {} ({} {}) -> {} ({})",
        args.input.display(),
        from.id(),
        output.metadata.source_version,
        output_path.display(),
        args.to.id()
    );
    Ok(())
}
