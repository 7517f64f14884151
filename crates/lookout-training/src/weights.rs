use crate::error::{TrainingError, TrainingResult};
use std::path::{Path, PathBuf};

/// Filesystem layout for one run's artifacts.
///
/// Engines save under `{project}/{name}/weights/{best,last}.pt`.
#[derive(Debug, Clone)]
pub struct RunLayout {
    run_dir: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(project: &Path, name: &str) -> Self {
        Self { run_dir: project.join(name) }
    }

    #[must_use]
    pub fn weights_dir(&self) -> PathBuf {
        self.run_dir.join("weights")
    }

    #[must_use]
    pub fn best_weights(&self) -> PathBuf {
        self.weights_dir().join("best.pt")
    }

    #[must_use]
    pub fn last_weights(&self) -> PathBuf {
        self.weights_dir().join("last.pt")
    }

    /// Resolve the trained checkpoint: prefer `best.pt`, fall back to
    /// `last.pt`.
    pub fn resolve_weights(&self) -> TrainingResult<PathBuf> {
        let best = self.best_weights();
        if best.exists() {
            return Ok(best);
        }
        let last = self.last_weights();
        if last.exists() {
            return Ok(last);
        }
        Err(TrainingError::WeightsNotFound { dir: self.weights_dir() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_with(files: &[&str]) -> (TempDir, RunLayout) {
        let temp = TempDir::new().unwrap();
        let layout = RunLayout::new(temp.path(), "obstacles");
        std::fs::create_dir_all(layout.weights_dir()).unwrap();
        for f in files {
            std::fs::write(layout.weights_dir().join(f), b"ckpt").unwrap();
        }
        (temp, layout)
    }

    #[test]
    fn test_resolve_prefers_best_over_last() {
        let (_temp, layout) = layout_with(&["best.pt", "last.pt"]);
        assert_eq!(layout.resolve_weights().unwrap(), layout.best_weights());
    }

    #[test]
    fn test_resolve_falls_back_to_last() {
        let (_temp, layout) = layout_with(&["last.pt"]);
        assert_eq!(layout.resolve_weights().unwrap(), layout.last_weights());
    }

    #[test]
    fn test_resolve_errors_when_neither_exists() {
        let (_temp, layout) = layout_with(&[]);
        assert!(matches!(
            layout.resolve_weights(),
            Err(TrainingError::WeightsNotFound { .. })
        ));
    }
}
