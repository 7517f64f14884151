use crate::config::RunConfig;
use crate::device::DeviceSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Failures reported by a detection engine.
///
/// The orchestrator only cares about one distinction: accelerator memory
/// exhaustion versus everything else. Engines that cannot classify their own
/// failures can report `Failed` with the raw message; [`EngineError::is_out_of_memory`]
/// falls back to substring matching.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("out of accelerator memory: {0}")]
    OutOfMemory(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

const OOM_MARKERS: &[&str] = &["out of memory", "CUDA out of memory", "OutOfMemoryError"];

impl EngineError {
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        match self {
            Self::OutOfMemory(_) => true,
            Self::Failed(message) => {
                let lower = message.to_lowercase();
                OOM_MARKERS.iter().any(|m| lower.contains(&m.to_lowercase()))
            }
            Self::Io(_) => false,
        }
    }
}

/// Parameters for one validation attempt against trained weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRequest {
    pub weights: PathBuf,
    pub data: PathBuf,
    pub image_size: u32,
    pub batch: u32,
    pub device: DeviceSpec,
    /// Dataloader worker processes. `None` leaves the engine default.
    pub workers: Option<u32>,
    /// Experiment-tracking toggle, inherited from the run. The toggle is set
    /// once per run and carries through validation unchanged.
    pub tracking: bool,
}

/// Detection quality metrics reported by a validation pass.
///
/// The orchestrator passes these through without interpreting them.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ValidationMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub map50: Option<f64>,
    pub map50_95: Option<f64>,
}

/// An object-detection training/validation engine.
///
/// Implementations are opaque capabilities: `train` blocks until the run
/// finishes, `validate` blocks until metrics are available. Internal
/// parallelism (dataloader workers, DDP) is the engine's business.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    fn id(&self) -> &'static str;

    async fn train(&self, config: &RunConfig) -> EngineResult<()>;

    async fn validate(&self, request: &ValidationRequest) -> EngineResult<ValidationMetrics>;

    /// Release any cached accelerator memory held by a previous phase.
    ///
    /// Best-effort: callers discard the error. Must be safe to call when no
    /// accelerator is present.
    async fn release_accelerator_memory(&self) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oom_category_is_out_of_memory() {
        assert!(EngineError::OutOfMemory("CUDA error".to_string()).is_out_of_memory());
    }

    #[test]
    fn test_oom_detected_by_message_substring() {
        let err = EngineError::Failed(
            "torch.cuda.OutOfMemoryError: CUDA out of memory. Tried to allocate 512 MiB".to_string(),
        );
        assert!(err.is_out_of_memory());

        let err = EngineError::Failed("RuntimeError: CUDA Out Of Memory on device 0".to_string());
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn test_non_oom_failures_are_not_misclassified() {
        assert!(!EngineError::Failed("dataset not found: data.yaml".to_string()).is_out_of_memory());
        let io = EngineError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "yolo"));
        assert!(!io.is_out_of_memory());
    }
}
