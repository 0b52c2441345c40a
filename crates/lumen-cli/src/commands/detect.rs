use std::path::Path;

use anyhow::Result;
use lumen_io::ConversionManager;

use crate::commands::util::{print_json, read_input};

pub fn handle(manager: &ConversionManager, input: &Path, json: bool) -> Result<()> {
    let bytes = read_input(input)?;
    let report = manager.detect_format(&bytes)?;
    if json {
        return print_json(&report);
    }
    println!(
        "{}: {} {} (confidence {:.2})",
        input.display(),
        report.format.id(),
        report.version,
        report.confidence
    );
    for alt in &report.alternatives {
        println!("  also: {} {} ({:.2})", alt.format.id(), alt.version, alt.confidence);
    }
    Ok(())
}
