use crate::job::{BatchJob, BatchJobRecord};
use crate::manifest::{load_batch_manifest, write_batch_manifest, BatchManifest, MANIFEST_FILE};
use anyhow::{bail, Context, Result};
use lumen_core::MetadataOverrides;
use lumen_io::ConversionManager;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct BatchRunnerConfig {
    pub jobs: Vec<BatchJob>,
    pub output_root: PathBuf,
    /// Applied to every job between parse and write
    pub overrides: MetadataOverrides,
    /// Fail a job when its conversion produced any warning
    pub strict: bool,
    /// 0 = one worker per core
    pub threads: usize,
    /// Skip jobs the existing manifest already lists as converted
    pub resume: bool,
}

/// Summary returned after the run so clients can log success/failure counts and manifest location.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    /// Jobs taken over from the previous manifest
    pub resumed: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

/// Convert every job on a rayon pool sharing one manager.
///
/// A failing job never stops the others; its error lands in the manifest.
pub fn run_batch(config: &BatchRunnerConfig, manager: &ConversionManager) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for batch runs")?;
    let manifest_path = config.output_root.join(MANIFEST_FILE);
    let previous = if config.resume {
        load_batch_manifest(&manifest_path)?
    } else {
        None
    };
    let completed = previous
        .as_ref()
        .map(|manifest| manifest.completed_jobs(&config.jobs))
        .unwrap_or_default();
    info!(
        jobs = config.jobs.len(),
        resumed = completed.len(),
        threads = thread_count,
        "starting batch"
    );

    let job_records: Vec<BatchJobRecord> = pool.install(|| {
        config
            .jobs
            .par_iter()
            .map(|job| match completed.get(&job.job_id) {
                Some(record) => (*record).clone(),
                None => run_job(job, config, manager),
            })
            .collect()
    });

    let manifest = BatchManifest::from_records(job_records, completed.len());
    write_batch_manifest(&manifest_path, &manifest)?;
    info!(
        success = manifest.success,
        failure = manifest.failure,
        manifest = %manifest_path.display(),
        "batch finished"
    );
    Ok(BatchSummary {
        success: manifest.success,
        failure: manifest.failure,
        resumed: manifest.resumed,
        manifest_path,
        jobs: manifest.jobs,
    })
}

/// Read, convert and write a single file.
fn run_job(job: &BatchJob, config: &BatchRunnerConfig, manager: &ConversionManager) -> BatchJobRecord {
    let mut source_format = job.source_format;
    let mut warnings = 0;

    let mut runner = || -> Result<()> {
        let bytes = fs::read(&job.source)
            .with_context(|| format!("reading '{}'", job.source.display()))?;
        let from = match source_format {
            Some(format) => format,
            None => {
                let detected = manager.detect_format(&bytes)?;
                source_format = Some(detected.format);
                detected.format
            }
        };
        let output =
            manager.convert_with_overrides(&bytes, from, job.target_format, &config.overrides)?;
        warnings = output.diagnostics.warning_count();
        if config.strict && warnings > 0 {
            bail!(
                "{} warning(s) in strict mode: {}",
                warnings,
                output.warnings().join("; ")
            );
        }
        fs::write(&job.output, &output.bytes)
            .with_context(|| format!("writing '{}'", job.output.display()))?;
        Ok(())
    };
    let status = runner();
    let (status_label, error) = match status {
        Ok(_) => ("ok".to_string(), None),
        Err(err) => {
            warn!(job = %job.job_id, "batch job failed: {err:#}");
            ("error".to_string(), Some(format!("{err:#}")))
        }
    };
    BatchJobRecord {
        job_id: job.job_id.clone(),
        source: job.source.display().to_string(),
        source_format,
        target_format: job.target_format,
        status: status_label,
        error,
        output: job.output.display().to_string(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::jobs_from_paths;
    use lumen_io::Format;
    use tempfile::TempDir;

    const IES: &str = "IESNA:LM-63-2002\n[MANUFAC] Acme\n[LUMCAT] A-1\nTILT=NONE\n\
1 1000 1 3 1 1 2 0 0 0\n1 1 10\n0 45 90\n0\n100 80 0\n";

    fn config(dir: &TempDir, paths: &[PathBuf], target: Format) -> BatchRunnerConfig {
        let output_root = dir.path().join("out");
        BatchRunnerConfig {
            jobs: jobs_from_paths(paths, target, &output_root),
            output_root,
            overrides: MetadataOverrides::default(),
            strict: false,
            threads: 2,
            resume: false,
        }
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.ies");
        let bad = dir.path().join("bad.ies");
        fs::write(&good, IES).unwrap();
        fs::write(&bad, "IESNA:LM-63-2002\n[MANUFAC] x\n").unwrap();

        let config = config(&dir, &[good, bad], Format::Ldt);
        let summary = run_batch(&config, &ConversionManager::new()).unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failure, 1);
        assert!(summary.manifest_path.exists());
        assert!(config.output_root.join("good.ldt").exists());
        let failed = summary.jobs.iter().find(|j| j.status == "error").unwrap();
        assert!(failed.error.as_deref().unwrap().contains("ies.tilt_missing"));
    }

    #[test]
    fn unknown_extension_is_detected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("lamp.dat");
        fs::write(&input, IES).unwrap();

        let summary = run_batch(&config(&dir, &[input], Format::Ies), &ConversionManager::new()).unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.jobs[0].source_format, Some(Format::Ies));
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("lamp.ies");
        fs::write(&input, IES).unwrap();

        let mut config = config(&dir, &[input], Format::Cie);
        config.strict = true;
        let summary = run_batch(&config, &ConversionManager::new()).unwrap();
        assert_eq!(summary.failure, 1);
        assert!(summary.jobs[0].warnings > 0);
        assert!(!config.output_root.join("lamp.cie").exists());
    }

    #[test]
    fn resume_skips_converted_files() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.ies");
        let bad = dir.path().join("bad.ies");
        fs::write(&good, IES).unwrap();
        fs::write(&bad, "IESNA:LM-63-2002\n[MANUFAC] x\n").unwrap();

        let mut config = config(&dir, &[good, bad.clone()], Format::Ldt);
        let first = run_batch(&config, &ConversionManager::new()).unwrap();
        assert_eq!(first.resumed, 0);

        // A rerun must not touch the output that is already there.
        let converted = config.output_root.join("good.ldt");
        fs::write(&converted, "kept").unwrap();
        fs::write(&bad, IES).unwrap();
        config.resume = true;
        let second = run_batch(&config, &ConversionManager::new()).unwrap();

        assert_eq!(second.resumed, 1);
        assert_eq!(second.success, 2);
        assert_eq!(fs::read_to_string(&converted).unwrap(), "kept");
        assert!(config.output_root.join("bad.ldt").exists());

        let manifest = load_batch_manifest(&second.manifest_path).unwrap().unwrap();
        assert_eq!(manifest.resumed, 1);
        assert_eq!(manifest.by_source_format["ies"].ok, 2);
    }
}
