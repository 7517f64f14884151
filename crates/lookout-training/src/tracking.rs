//! Experiment-tracking side-channel.
//!
//! Tracking is strictly best-effort: every error from this module is
//! discarded at the call site (warn log at most) and never aborts a run.

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking login failed: {0}")]
    Login(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Tracker: Send + Sync {
    async fn login(&self, api_key: &str) -> TrackingResult<()>;
}

/// Logs into Weights & Biases through its CLI.
#[derive(Debug, Default)]
pub struct WandbCliTracker;

#[async_trait]
impl Tracker for WandbCliTracker {
    async fn login(&self, api_key: &str) -> TrackingResult<()> {
        let status = Command::new("wandb")
            .args(["login", "--relogin", api_key])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if status.success() {
            debug!("wandb login succeeded");
            Ok(())
        } else {
            Err(TrackingError::Login(format!("wandb login exited with {status}")))
        }
    }
}

/// Used when tracking is disabled.
#[derive(Debug, Default)]
pub struct NoopTracker;

#[async_trait]
impl Tracker for NoopTracker {
    async fn login(&self, _api_key: &str) -> TrackingResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_tracker_always_succeeds() {
        assert!(NoopTracker.login("any-key").await.is_ok());
    }
}
