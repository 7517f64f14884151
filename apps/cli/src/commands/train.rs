//! Training command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lookout_training::{
    Orchestrator, RunConfig, RunParams, Tracker, ValidationMetrics, WandbCliTracker, YoloCliEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub struct TrainArgs {
    pub data: PathBuf,
    pub model: String,
    pub epochs: u32,
    pub batch: u32,
    pub imgsz: u32,
    pub device: String,
    pub project: PathBuf,
    pub name: String,
    pub resume: bool,
    pub wandb: bool,
}

pub async fn execute(args: TrainArgs) -> Result<()> {
    let config = RunConfig::new(RunParams {
        data: args.data,
        model: args.model,
        epochs: args.epochs,
        batch: args.batch,
        image_size: args.imgsz,
        device: args.device,
        project: args.project,
        name: args.name,
        resume: args.resume,
        tracking: args.wandb,
    })
    .context("Invalid run parameters")?;

    // Side-channel login is best-effort; a failure never aborts the run.
    if config.tracking {
        if let Ok(api_key) = std::env::var("WANDB_API_KEY") {
            if let Err(err) = WandbCliTracker.login(&api_key).await {
                warn!("tracking login failed (continuing without it): {err}");
            }
        }
    }

    let engine = Arc::new(YoloCliEngine::new());
    let metrics = Orchestrator::new(engine)
        .execute(&config)
        .await
        .context("Training run failed")?;

    print_metrics(&config.name, &metrics);
    Ok(())
}

fn print_metrics(run_name: &str, metrics: &ValidationMetrics) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
    println!();
    println!("{}", format!("Validation complete: {run_name}").bold().green());
    println!("  Precision: {}", fmt(metrics.precision).cyan());
    println!("  Recall:    {}", fmt(metrics.recall).cyan());
    println!("  mAP50:     {}", fmt(metrics.map50).cyan());
    println!("  mAP50-95:  {}", fmt(metrics.map50_95).cyan());
    println!();
}
