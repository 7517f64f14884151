//! Lookout Training
//!
//! Orchestration primitives around an external object-detection engine:
//! - Describing a training run (`RunConfig`, `DeviceSpec`)
//! - Resolving trained weights (`RunLayout`)
//! - Driving engines behind the `DetectionEngine` trait
//! - The OOM-tolerant validation fallback (`Orchestrator`)
//! - Fetching datasets from a remote registry (`DatasetClient`)

pub mod config;
pub mod dataset;
pub mod device;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod tracking;
pub mod weights;
pub mod yolo;

pub use config::{RunConfig, RunParams};
pub use dataset::{DatasetClient, DatasetRef};
pub use device::DeviceSpec;
pub use engine::{DetectionEngine, EngineError, EngineResult, ValidationMetrics, ValidationRequest};
pub use error::{TrainingError, TrainingResult};
pub use orchestrator::{Orchestrator, ValidationAttempt};
pub use tracking::{NoopTracker, Tracker, TrackingError, WandbCliTracker};
pub use weights::RunLayout;
pub use yolo::YoloCliEngine;
