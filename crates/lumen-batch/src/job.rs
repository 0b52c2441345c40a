use lumen_io::Format;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One file to convert.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: String,
    pub source: PathBuf,
    /// `None` means detect from content
    pub source_format: Option<Format>,
    pub target_format: Format,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub source: String,
    pub source_format: Option<Format>,
    pub target_format: Format,
    pub status: String,
    pub error: Option<String>,
    pub output: String,
    pub warnings: usize,
}

impl BatchJobRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Build one job per input. Outputs land flat in `output_root`, named after
/// the input stem with the target's default extension. Repeated stems get a
/// numeric suffix so no job overwrites another.
pub fn jobs_from_paths(paths: &[PathBuf], target: Format, output_root: &Path) -> Vec<BatchJob> {
    let mut used = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            let mut name = stem.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                n += 1;
                name = format!("{stem}-{n}");
            }
            BatchJob {
                job_id: format!("{}:{}", target.id(), name),
                source: path.clone(),
                source_format: Format::from_path(path),
                target_format: target,
                output: output_root.join(format!("{name}.{}", target.default_extension())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_from_paths_builds_identifiers() {
        let paths = vec![PathBuf::from("in/a.ies"), PathBuf::from("in/b.unknown")];
        let jobs = jobs_from_paths(&paths, Format::Ldt, Path::new("out"));
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, "ldt:a");
        assert_eq!(jobs[0].source_format, Some(Format::Ies));
        assert_eq!(jobs[0].output, PathBuf::from("out/a.ldt"));
        assert_eq!(jobs[1].source_format, None);
    }

    #[test]
    fn repeated_stems_do_not_collide() {
        let paths = vec![PathBuf::from("x/a.ies"), PathBuf::from("y/a.ldt")];
        let jobs = jobs_from_paths(&paths, Format::Cie, Path::new("out"));
        assert_eq!(jobs[1].job_id, "cie:a-2");
        assert_eq!(jobs[1].output, PathBuf::from("out/a-2.cie"));
    }
}
