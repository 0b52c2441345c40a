use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use lumen_batch::{jobs_from_paths, run_batch, BatchRunnerConfig};
use lumen_core::MetadataOverrides;
use lumen_io::{ConversionManager, Format};
use serde_json::json;

use crate::commands::util::{collect_inputs, print_json};

pub struct BatchArgs<'a> {
    pub inputs: &'a [PathBuf],
    pub to: Format,
    pub output: &'a Path,
    pub threads: usize,
    pub strict: bool,
    pub resume: bool,
    pub json: bool,
    pub overrides: MetadataOverrides,
}

pub fn handle(manager: &ConversionManager, args: BatchArgs<'_>) -> Result<()> {
    let files = collect_inputs(args.inputs)?;
    if files.is_empty() {
        bail!("no photometric files found in the given inputs");
    }

    let config = BatchRunnerConfig {
        jobs: jobs_from_paths(&files, args.to, args.output),
        output_root: args.output.to_path_buf(),
        overrides: args.overrides,
        strict: args.strict,
        threads: args.threads,
        resume: args.resume,
    };
    let summary = run_batch(&config, manager)?;

    if args.json {
        print_json(&json!({
            "success": summary.success,
            "failure": summary.failure,
            "resumed": summary.resumed,
            "manifest": summary.manifest_path,
        }))?;
    } else {
        for job in summary.jobs.iter().filter(|job| !job.is_ok()) {
            println!("failed {}: {}", job.source, job.error.as_deref().unwrap_or("unknown error"));
        }
        println!(
            "Batch: {} ok, {} failed; manifest {}",
            summary.success,
            summary.failure,
            summary.manifest_path.display()
        );
        if summary.resumed > 0 {
            println!("{} already converted by an earlier run", summary.resumed);
        }
    }

    if summary.failure > 0 {
        bail!("{} of {} jobs failed", summary.failure, summary.jobs.len());
    }
    Ok(())
}
