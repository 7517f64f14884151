use crate::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid run config: {0}")]
    InvalidConfig(String),

    #[error("training failed: {0}")]
    Training(#[source] EngineError),

    #[error("no trained weights found under {}", dir.display())]
    WeightsNotFound { dir: PathBuf },

    #[error("validation failed: {0}")]
    Validation(#[source] EngineError),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
