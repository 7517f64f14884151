//! Dataset fetch command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lookout_training::{DatasetClient, DatasetRef};
use std::path::PathBuf;

pub async fn execute(
    workspace: String,
    project: String,
    version: u32,
    format: String,
    dest: PathBuf,
    api_key_env: &str,
) -> Result<()> {
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("Registry API key not set (expected in ${api_key_env})"))?;

    let dataset = DatasetRef { workspace, project, version, format };
    let client = DatasetClient::new(api_key);
    let archive = client
        .download(&dataset, &dest)
        .await
        .context("Dataset download failed")?;

    // List only this download's location, not the whole destination dir.
    let location = archive.parent().map_or(dest.as_path(), |p| p);

    println!();
    println!("{}", "Dataset download complete".bold().green());
    println!("  Archive: {}", archive.display().to_string().cyan());
    println!();
    println!("  {}", format!("Contents of {}:", location.display()).dimmed());
    for line in lookout_training::dataset::list_contents(location)? {
        println!("  {}", line.dimmed());
    }
    println!();
    Ok(())
}
