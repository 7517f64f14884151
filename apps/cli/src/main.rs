//! Lookout CLI - train an object detector and validate it with OOM fallback.
//!
//! Provides a `lookout` command wrapping an external detection engine:
//! `lookout train` runs one training pass plus the degrading validation
//! sequence, `lookout fetch` pulls a dataset export from the registry.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Lookout - detection training orchestration
#[derive(Parser, Debug)]
#[command(
    name = "lookout",
    author,
    version,
    about = "Train an object detector and validate it, tolerating GPU memory pressure"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run training followed by the fallback validation pass
    Train {
        /// Path to the dataset descriptor (data.yaml)
        #[arg(long, default_value = "/data/obstacles/data.yaml")]
        data: PathBuf,

        /// Model cfg or weights reference (e.g. yolov8n.pt, /ckpt/best.pt)
        #[arg(long, default_value = "yolov8n.pt")]
        model: String,

        #[arg(long, default_value_t = 50)]
        epochs: u32,

        #[arg(long, default_value_t = 16)]
        batch: u32,

        /// Square image size in pixels
        #[arg(long, default_value_t = 640)]
        imgsz: u32,

        /// Device string: "0", "0,1,2,3", "cpu", or empty for engine default
        #[arg(long, default_value = "")]
        device: String,

        /// Directory runs are saved under
        #[arg(long, default_value = "runs/detect")]
        project: PathBuf,

        /// Run name within the project
        #[arg(long, default_value = "obstacles")]
        name: String,

        /// Resume the last run
        #[arg(long)]
        resume: bool,

        /// Enable Weights & Biases logging (reads WANDB_API_KEY if set)
        #[arg(long)]
        wandb: bool,
    },

    /// Download a dataset export from the registry
    Fetch {
        #[arg(long)]
        workspace: String,

        #[arg(long)]
        project: String,

        #[arg(long)]
        version: u32,

        /// Export format
        #[arg(long, default_value = "yolov5")]
        format: String,

        /// Existing directory to download into
        #[arg(long, default_value = "/data")]
        dest: PathBuf,

        /// Environment variable holding the registry API key
        #[arg(long, default_value = "LOOKOUT_API_KEY")]
        api_key_env: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train {
            data,
            model,
            epochs,
            batch,
            imgsz,
            device,
            project,
            name,
            resume,
            wandb,
        } => {
            commands::train::execute(commands::train::TrainArgs {
                data,
                model,
                epochs,
                batch,
                imgsz,
                device,
                project,
                name,
                resume,
                wandb,
            })
            .await
        }
        Command::Fetch { workspace, project, version, format, dest, api_key_env } => {
            commands::fetch::execute(workspace, project, version, format, dest, &api_key_env).await
        }
    }
}
