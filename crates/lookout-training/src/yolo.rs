//! Detection engine backed by the external `yolo` CLI (Ultralytics).
//!
//! Every capability is a child-process invocation; the engine never links
//! against the framework. The experiment-tracking toggle is scoped to the
//! child's environment rather than mutated process-wide.

use crate::config::RunConfig;
use crate::engine::{DetectionEngine, EngineError, EngineResult, ValidationMetrics, ValidationRequest};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

pub struct YoloCliEngine {
    program: String,
}

impl Default for YoloCliEngine {
    fn default() -> Self {
        Self { program: "yolo".to_string() }
    }
}

impl YoloCliEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable name/path (tests, custom forks).
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    async fn run(&self, args: &[String], tracking: bool) -> EngineResult<String> {
        info!("running: {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .env("WANDB_DISABLED", if tracking { "false" } else { "true" })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(classify_failure(output.status.code(), &stderr));
        }
        debug!("{} exited cleanly", self.program);
        Ok(stdout)
    }
}

/// Map a non-zero child exit to an engine error, classifying accelerator
/// memory exhaustion from the stderr text.
fn classify_failure(code: Option<i32>, stderr: &str) -> EngineError {
    let detail = stderr.trim();
    let message = match code {
        Some(code) => format!("exit code {code}: {detail}"),
        None => format!("terminated by signal: {detail}"),
    };
    let err = EngineError::Failed(message);
    if err.is_out_of_memory() {
        EngineError::OutOfMemory(detail.to_string())
    } else {
        err
    }
}

fn train_args(config: &RunConfig) -> Vec<String> {
    let mut args = vec![
        "train".to_string(),
        format!("model={}", config.model),
        format!("data={}", config.data.display()),
        format!("epochs={}", config.epochs),
        format!("batch={}", config.batch),
        format!("imgsz={}", config.image_size),
        format!("project={}", config.project.display()),
        format!("name={}", config.name),
    ];
    if let Some(device) = config.device.engine_arg() {
        args.push(format!("device={device}"));
    }
    if config.resume {
        args.push("resume=True".to_string());
    }
    args
}

fn val_args(request: &ValidationRequest) -> Vec<String> {
    let mut args = vec![
        "val".to_string(),
        format!("model={}", request.weights.display()),
        format!("data={}", request.data.display()),
        format!("imgsz={}", request.image_size),
        format!("batch={}", request.batch),
    ];
    if let Some(device) = request.device.engine_arg() {
        args.push(format!("device={device}"));
    }
    if let Some(workers) = request.workers {
        args.push(format!("workers={workers}"));
    }
    args
}

/// Parse the summary row of `yolo val` output.
///
/// The CLI prints a per-class table whose `all` row carries
/// `Images Instances P R mAP50 mAP50-95`. Absent or unparseable output
/// yields empty metrics rather than a failure; the run already succeeded.
fn parse_val_summary(stdout: &str) -> ValidationMetrics {
    for line in stdout.lines().rev() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() >= 7 && cols[0] == "all" {
            return ValidationMetrics {
                precision: cols[3].parse().ok(),
                recall: cols[4].parse().ok(),
                map50: cols[5].parse().ok(),
                map50_95: cols[6].parse().ok(),
            };
        }
    }
    ValidationMetrics::default()
}

#[async_trait]
impl DetectionEngine for YoloCliEngine {
    fn id(&self) -> &'static str {
        "yolo-cli"
    }

    async fn train(&self, config: &RunConfig) -> EngineResult<()> {
        self.run(&train_args(config), config.tracking).await.map(|_| ())
    }

    async fn validate(&self, request: &ValidationRequest) -> EngineResult<ValidationMetrics> {
        let stdout = self.run(&val_args(request), request.tracking).await?;
        Ok(parse_val_summary(&stdout))
    }

    async fn release_accelerator_memory(&self) -> EngineResult<()> {
        // The CLI holds no memory between invocations; clear whatever the
        // framework's cache allocator kept in this environment.
        let status = Command::new("python3")
            .args(["-c", "import torch; torch.cuda.empty_cache()"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Failed("torch cache release exited non-zero".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_params;
    use crate::device::DeviceSpec;
    use std::path::PathBuf;

    #[test]
    fn test_train_args_include_device_and_resume() {
        let mut params = test_params();
        params.device = "0,1,2,3".to_string();
        params.resume = true;
        let config = RunConfig::new(params).unwrap();

        let args = train_args(&config);
        assert_eq!(args[0], "train");
        assert!(args.contains(&"model=yolov8n.pt".to_string()));
        assert!(args.contains(&"epochs=50".to_string()));
        assert!(args.contains(&"batch=16".to_string()));
        assert!(args.contains(&"imgsz=640".to_string()));
        assert!(args.contains(&"device=0,1,2,3".to_string()));
        assert!(args.contains(&"resume=True".to_string()));
    }

    #[test]
    fn test_train_args_omit_device_when_default() {
        let mut params = test_params();
        params.device = String::new();
        let config = RunConfig::new(params).unwrap();

        let args = train_args(&config);
        assert!(!args.iter().any(|a| a.starts_with("device=")));
        assert!(!args.contains(&"resume=True".to_string()));
    }

    #[test]
    fn test_val_args_carry_narrowed_parameters() {
        let request = ValidationRequest {
            weights: PathBuf::from("runs/detect/obstacles/weights/best.pt"),
            data: PathBuf::from("/data/obstacles/data.yaml"),
            image_size: 640,
            batch: 8,
            device: DeviceSpec::Cuda(vec![0]),
            workers: Some(2),
            tracking: false,
        };
        let args = val_args(&request);
        assert_eq!(args[0], "val");
        assert!(args.contains(&"model=runs/detect/obstacles/weights/best.pt".to_string()));
        assert!(args.contains(&"batch=8".to_string()));
        assert!(args.contains(&"device=0".to_string()));
        assert!(args.contains(&"workers=2".to_string()));
    }

    #[test]
    fn test_classify_failure_detects_oom() {
        let err = classify_failure(
            Some(1),
            "torch.cuda.OutOfMemoryError: CUDA out of memory. Tried to allocate 2.00 GiB",
        );
        assert!(matches!(err, EngineError::OutOfMemory(_)));

        let err = classify_failure(Some(2), "FileNotFoundError: data.yaml");
        assert!(matches!(err, EngineError::Failed(_)));
        assert!(!err.is_out_of_memory());
    }

    #[test]
    fn test_parse_val_summary_reads_all_row() {
        let stdout = "\
                 Class     Images  Instances      Box(P          R      mAP50  mAP50-95)
                   all        128       1427      0.912      0.884      0.901      0.718
                person         61        254      0.956      0.899      0.944      0.756
Speed: 0.2ms preprocess, 4.1ms inference per image
";
        let metrics = parse_val_summary(stdout);
        assert_eq!(metrics.precision, Some(0.912));
        assert_eq!(metrics.recall, Some(0.884));
        assert_eq!(metrics.map50, Some(0.901));
        assert_eq!(metrics.map50_95, Some(0.718));
    }

    #[test]
    fn test_parse_val_summary_tolerates_missing_table() {
        assert_eq!(parse_val_summary("no table here"), ValidationMetrics::default());
    }
}
