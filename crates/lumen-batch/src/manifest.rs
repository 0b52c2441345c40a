use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::job::{BatchJob, BatchJobRecord};

/// File name of the manifest inside a batch output directory.
pub const MANIFEST_FILE: &str = "batch_manifest.json";

/// Outcome counts for one source format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatTally {
    pub ok: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub num_jobs: usize,
    pub success: usize,
    pub failure: usize,
    /// Jobs carried over from an earlier run instead of converted again
    #[serde(default)]
    pub resumed: usize,
    /// Keyed by source format id; "unknown" when detection failed
    #[serde(default)]
    pub by_source_format: BTreeMap<String, FormatTally>,
    pub jobs: Vec<BatchJobRecord>,
}

impl BatchManifest {
    pub fn from_records(jobs: Vec<BatchJobRecord>, resumed: usize) -> Self {
        let mut by_source_format: BTreeMap<String, FormatTally> = BTreeMap::new();
        for job in &jobs {
            let key = job.source_format.map_or("unknown", |format| format.id());
            let tally = by_source_format.entry(key.to_string()).or_default();
            if job.is_ok() {
                tally.ok += 1;
            } else {
                tally.failed += 1;
            }
        }
        let success = jobs.iter().filter(|job| job.is_ok()).count();
        BatchManifest {
            created_at: Utc::now(),
            num_jobs: jobs.len(),
            success,
            failure: jobs.len() - success,
            resumed,
            by_source_format,
            jobs,
        }
    }

    /// Records of earlier successful jobs that still match `job` and whose
    /// output is still on disk, keyed by job id.
    pub fn completed_jobs<'a>(&'a self, jobs: &[BatchJob]) -> HashMap<String, &'a BatchJobRecord> {
        let previous: HashMap<&str, &BatchJobRecord> = self
            .jobs
            .iter()
            .filter(|record| record.is_ok())
            .map(|record| (record.job_id.as_str(), record))
            .collect();
        jobs.iter()
            .filter_map(|job| {
                let record = previous.get(job.job_id.as_str())?;
                let same_job = record.source == job.source.display().to_string()
                    && record.output == job.output.display().to_string()
                    && record.target_format == job.target_format;
                (same_job && job.output.exists()).then(|| (job.job_id.clone(), *record))
            })
            .collect()
    }
}

pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(manifest).context("serializing batch manifest")?;
    fs::write(path, json).with_context(|| format!("writing batch manifest '{}'", path.display()))
}

/// Read the manifest of an earlier run; `None` when there is none yet.
pub fn load_batch_manifest(path: &Path) -> Result<Option<BatchManifest>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading batch manifest '{}'", path.display()))?;
    let manifest = serde_json::from_str(&text)
        .with_context(|| format!("parsing batch manifest '{}'", path.display()))?;
    Ok(Some(manifest))
}
