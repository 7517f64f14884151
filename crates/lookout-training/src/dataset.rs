//! Dataset registry client.
//!
//! Downloads labeled dataset exports from a Roboflow-style hosting API:
//! fetch the version's export descriptor, then stream the archive to disk.

use crate::error::{TrainingError, TrainingResult};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;
use walkdir::WalkDir;

const DEFAULT_BASE_URL: &str = "https://api.roboflow.com";

/// Coordinates of one dataset version on the registry.
#[derive(Debug, Clone)]
pub struct DatasetRef {
    pub workspace: String,
    pub project: String,
    pub version: u32,
    /// Export format (e.g. `yolov5`, `yolov8`).
    pub format: String,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    export: ExportDescriptor,
}

#[derive(Debug, Deserialize)]
struct ExportDescriptor {
    link: String,
}

pub struct DatasetClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl DatasetClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different registry endpoint (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Download one dataset version's export archive into `dest`.
    ///
    /// `dest` must already exist; the download gets its own location
    /// `{dest}/{project}-{version}/`, with the archive at
    /// `{project}-{version}.{format}.zip` inside it. The archive body is
    /// streamed to disk chunk by chunk; exports run to hundreds of MB.
    pub async fn download(&self, dataset: &DatasetRef, dest: &Path) -> TrainingResult<PathBuf> {
        if !dest.is_dir() {
            return Err(TrainingError::Dataset(format!(
                "download destination does not exist: {}",
                dest.display()
            )));
        }

        let descriptor_url = format!(
            "{}/{}/{}/{}/{}",
            self.base_url, dataset.workspace, dataset.project, dataset.version, dataset.format
        );
        info!("fetching export descriptor for {}/{}", dataset.project, dataset.version);
        let body = self
            .http
            .get(&descriptor_url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let export: ExportResponse = serde_json::from_slice(&body)?;

        let location = dest.join(location_name(dataset));
        std::fs::create_dir_all(&location)?;
        let archive_path = location.join(archive_name(dataset));
        info!("downloading export archive to {}", archive_path.display());

        let mut response = self.http.get(&export.export.link).send().await?.error_for_status()?;
        let mut file = File::create(&archive_path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(archive_path)
    }
}

fn location_name(dataset: &DatasetRef) -> String {
    format!("{}-{}", dataset.project, dataset.version)
}

fn archive_name(dataset: &DatasetRef) -> String {
    format!("{}-{}.{}.zip", dataset.project, dataset.version, dataset.format)
}

/// Indented listing of a downloaded dataset tree, one entry per line,
/// relative to `root`. Directories get a trailing slash.
pub fn list_contents(root: &Path) -> TrainingResult<Vec<String>> {
    let mut lines = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| TrainingError::Dataset(e.to_string()))?;
        let depth = entry.depth().saturating_sub(1);
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        lines.push(format!("{}{}{}", "  ".repeat(depth), name, suffix));
    }
    Ok(lines)
}
