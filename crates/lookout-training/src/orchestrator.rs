//! Training-validation orchestration.
//!
//! Runs training exactly once, then obtains validation metrics with a
//! two-rung degradation policy: a normal attempt (device-isolated and
//! batch-shrunk after multi-GPU training), and on accelerator OOM exactly one
//! degraded attempt on CPU with the batch halved again and no dataloader
//! workers. Training failures are never retried; non-OOM validation failures
//! are never degraded.

use crate::config::RunConfig;
use crate::device::DeviceSpec;
use crate::engine::{DetectionEngine, EngineError, ValidationMetrics, ValidationRequest};
use crate::error::{TrainingError, TrainingResult};
use crate::weights::RunLayout;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between multi-GPU training and single-device validation, giving
/// lingering DDP worker state time to release device memory.
const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// One candidate parameter set for a validation try.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationAttempt {
    pub device: DeviceSpec,
    pub batch: u32,
    pub workers: Option<u32>,
}

/// Plan the first validation attempt.
///
/// After multi-device training, validation is deliberately restricted to the
/// first device with a halved batch and a conservative worker count: running
/// validation across all devices right after DDP training risks lingering
/// context contention and spurious OOM. Single-device and CPU runs validate
/// with the training parameters unmodified.
///
/// Returns the attempt and whether isolation (and therefore the settle
/// pause) applies.
#[must_use]
pub fn initial_attempt(config: &RunConfig) -> (ValidationAttempt, bool) {
    if config.device.is_multi() {
        let attempt = ValidationAttempt {
            device: config.device.isolated(),
            batch: (config.batch / 2).max(1),
            workers: Some(2),
        };
        (attempt, true)
    } else {
        let attempt = ValidationAttempt {
            device: config.device.clone(),
            batch: config.batch,
            workers: None,
        };
        (attempt, false)
    }
}

/// Plan the degraded attempt issued after an OOM failure.
///
/// Targets the CPU rather than a further-shrunk accelerator attempt:
/// persistent device OOM right after training is usually lingering context
/// memory, which a smaller batch on the same device does not reliably fix.
#[must_use]
pub fn degraded_attempt(first: &ValidationAttempt) -> ValidationAttempt {
    ValidationAttempt {
        device: DeviceSpec::Cpu,
        batch: (first.batch / 2).max(1),
        workers: Some(0),
    }
}

/// Drives one training run followed by the OOM-tolerant validation pass.
pub struct Orchestrator {
    engine: Arc<dyn DetectionEngine>,
    settle_delay: Duration,
}

impl Orchestrator {
    #[must_use]
    pub fn new(engine: Arc<dyn DetectionEngine>) -> Self {
        Self { engine, settle_delay: SETTLE_DELAY }
    }

    /// Override the settle pause (tests use `Duration::ZERO`).
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Train, resolve weights, then validate with fallback.
    ///
    /// Step order is strict: train, locate weights, release accelerator
    /// memory (best-effort), isolate device, shrink parameters, attempt
    /// validation, maybe degrade once.
    pub async fn execute(&self, config: &RunConfig) -> TrainingResult<ValidationMetrics> {
        info!(
            engine = self.engine.id(),
            model = %config.model,
            device = %config.device,
            "starting training run {}",
            config.name
        );
        self.engine.train(config).await.map_err(TrainingError::Training)?;

        let layout = RunLayout::new(&config.project, &config.name);
        let weights = layout.resolve_weights()?;
        debug!("resolved trained weights: {}", weights.display());

        // Best-effort; a missing accelerator or a release error must not
        // fail the run.
        if let Err(err) = self.engine.release_accelerator_memory().await {
            debug!("accelerator memory release failed (ignored): {err}");
        }

        self.validate_with_fallback(&weights, config).await
    }

    /// The two-rung validation policy.
    pub async fn validate_with_fallback(
        &self,
        weights: &Path,
        config: &RunConfig,
    ) -> TrainingResult<ValidationMetrics> {
        let (attempt, isolated) = initial_attempt(config);

        if isolated {
            info!(
                device = %attempt.device,
                batch = attempt.batch,
                "multi-GPU run: isolating validation, letting device memory settle"
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        match self.try_validate(weights, config, &attempt).await {
            Ok(metrics) => Ok(metrics),
            Err(err) if err.is_out_of_memory() => {
                let degraded = degraded_attempt(&attempt);
                warn!(
                    batch = degraded.batch,
                    "validation hit accelerator OOM; retrying once on {}",
                    degraded.device
                );
                self.try_validate(weights, config, &degraded)
                    .await
                    .map_err(TrainingError::Validation)
            }
            Err(err) => Err(TrainingError::Validation(err)),
        }
    }

    async fn try_validate(
        &self,
        weights: &Path,
        config: &RunConfig,
        attempt: &ValidationAttempt,
    ) -> Result<ValidationMetrics, EngineError> {
        let request = ValidationRequest {
            weights: weights.to_path_buf(),
            data: config.data.clone(),
            image_size: config.image_size,
            batch: attempt.batch,
            device: attempt.device.clone(),
            workers: attempt.workers,
            tracking: config.tracking,
        };
        self.engine.validate(&request).await
    }
}
