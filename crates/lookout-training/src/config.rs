use crate::device::DeviceSpec;
use crate::error::{TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External inputs for one training run, prior to validation.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Path to the dataset descriptor (e.g. `data.yaml`).
    pub data: PathBuf,
    /// Model cfg or weights reference (e.g. `yolov8n.pt`, `/ckpt/best.pt`).
    pub model: String,
    pub epochs: u32,
    pub batch: u32,
    pub image_size: u32,
    /// Engine device string: `""`, `"cpu"`, `"0"`, `"0,1,2,3"`.
    pub device: String,
    /// Directory runs are saved under.
    pub project: PathBuf,
    /// Run name within the project.
    pub name: String,
    pub resume: bool,
    /// Experiment-tracking side-channel toggle.
    pub tracking: bool,
}

/// Immutable description of a single training run.
///
/// Created once per invocation via [`RunConfig::new`] and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: PathBuf,
    pub model: String,
    pub epochs: u32,
    pub batch: u32,
    pub image_size: u32,
    pub device: DeviceSpec,
    pub project: PathBuf,
    pub name: String,
    pub resume: bool,
    pub tracking: bool,
    pub created_at: DateTime<Utc>,
}

impl RunConfig {
    pub fn new(params: RunParams) -> TrainingResult<Self> {
        if params.epochs == 0 {
            return Err(TrainingError::InvalidConfig("epochs must be >= 1".to_string()));
        }
        if params.batch == 0 {
            return Err(TrainingError::InvalidConfig("batch must be >= 1".to_string()));
        }
        if params.image_size == 0 {
            return Err(TrainingError::InvalidConfig("image_size must be >= 1".to_string()));
        }
        if params.model.trim().is_empty() {
            return Err(TrainingError::InvalidConfig("model reference is required".to_string()));
        }
        if params.name.trim().is_empty() {
            return Err(TrainingError::InvalidConfig("run name is required".to_string()));
        }
        let device = DeviceSpec::parse(&params.device)?;

        Ok(Self {
            data: params.data,
            model: params.model,
            epochs: params.epochs,
            batch: params.batch,
            image_size: params.image_size,
            device,
            project: params.project,
            name: params.name,
            resume: params.resume,
            tracking: params.tracking,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> RunParams {
    RunParams {
        data: PathBuf::from("/data/obstacles/data.yaml"),
        model: "yolov8n.pt".to_string(),
        epochs: 50,
        batch: 16,
        image_size: 640,
        device: "0".to_string(),
        project: PathBuf::from("runs/detect"),
        name: "obstacles".to_string(),
        resume: false,
        tracking: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_valid_params() {
        let config = RunConfig::new(test_params()).unwrap();
        assert_eq!(config.batch, 16);
        assert_eq!(config.device, DeviceSpec::Cuda(vec![0]));
    }

    #[test]
    fn test_new_rejects_zero_hyperparams() {
        let patches: [fn(&mut RunParams); 3] = [
            |p| p.epochs = 0,
            |p| p.batch = 0,
            |p| p.image_size = 0,
        ];
        for patch in patches {
            let mut params = test_params();
            patch(&mut params);
            assert!(matches!(
                RunConfig::new(params),
                Err(TrainingError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_new_rejects_blank_identity() {
        let mut params = test_params();
        params.name = "  ".to_string();
        assert!(RunConfig::new(params).is_err());

        let mut params = test_params();
        params.model = String::new();
        assert!(RunConfig::new(params).is_err());
    }

    #[test]
    fn test_new_rejects_bad_device_string() {
        let mut params = test_params();
        params.device = "zero".to_string();
        assert!(matches!(
            RunConfig::new(params),
            Err(TrainingError::InvalidConfig(_))
        ));
    }
}
