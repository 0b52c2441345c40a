use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lumen_io::{ConversionManager, Format};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading '{}'", path.display()))
}

/// Explicit format if given, otherwise whatever the content looks like.
pub fn source_format(
    manager: &ConversionManager,
    bytes: &[u8],
    explicit: Option<Format>,
) -> Result<Format> {
    match explicit {
        Some(format) => Ok(format),
        None => {
            let report = manager.detect_format(bytes)?;
            debug!(format = %report.format, confidence = report.confidence, "using detected format");
            Ok(report.format)
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value).context("serializing output to JSON")?;
    println!();
    Ok(())
}

/// Expand directories into the photometric files below them.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("scanning '{}'", path.display()))?;
            if entry.file_type().is_file() && Format::from_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
