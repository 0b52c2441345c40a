use std::path::Path;

use anyhow::{bail, Result};
use lumen_io::{ConversionManager, Format, ValidationResult};
use serde::Serialize;

use crate::commands::util::{print_json, read_input, source_format};

#[derive(Debug, Serialize)]
struct ValidateReport {
    format: Format,
    version: String,
    /// Recoverable problems met while parsing
    parse_warnings: Vec<String>,
    result: ValidationResult,
}

pub fn handle(
    manager: &ConversionManager,
    input: &Path,
    from: Option<Format>,
    strict: bool,
    json: bool,
) -> Result<()> {
    let bytes = read_input(input)?;
    let format = source_format(manager, &bytes, from)?;
    let imported = manager.parse(&bytes, format)?;
    let report = ValidateReport {
        format,
        version: imported.version.clone(),
        parse_warnings: imported.diagnostics.into_diagnostics().messages(),
        result: manager.validate(&imported.record),
    };

    if json {
        print_json(&report)?;
    } else {
        println!(
            "{}: {} {}, {} (score {:.2})",
            input.display(),
            format.id(),
            report.version,
            if report.result.is_valid { "valid" } else { "invalid" },
            report.result.score
        );
        for message in &report.parse_warnings {
            println!("  parse: {message}");
        }
        for message in &report.result.errors {
            println!("  error: {message}");
        }
        for message in &report.result.warnings {
            println!("  warning: {message}");
        }
    }

    if !report.result.is_valid {
        bail!("{} failed validation", input.display());
    }
    let warning_count = report.parse_warnings.len() + report.result.warnings.len();
    if strict && warning_count > 0 {
        bail!("{warning_count} warning(s) in strict mode");
    }
    Ok(())
}
