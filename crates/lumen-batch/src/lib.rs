//! Parallel batch conversion over a shared [`lumen_io::ConversionManager`].

pub mod job;
pub mod manifest;
pub mod runner;

pub use job::{jobs_from_paths, BatchJob, BatchJobRecord};
pub use manifest::{
    load_batch_manifest, write_batch_manifest, BatchManifest, FormatTally, MANIFEST_FILE,
};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary};
