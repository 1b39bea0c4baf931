//! Offline file storage using Tokio filesystem operations and Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::DownloadStore,
};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const APP_DIR: &str = "lesson-player";
const FILES_DIR: &str = "files";

/// Download store writing into a private directory on the local disk
///
/// Filenames are percent-encoded before touching the filesystem, so a
/// catalog id containing separators cannot escape the download area.
/// Downloads stream into `<name>.part` and are renamed once complete; a
/// half-written file is never reported as present.
pub struct TokioDownloadStore {
    client: Client,
    files_dir: PathBuf,
}

impl TokioDownloadStore {
    /// Store files under the platform data directory
    pub fn new() -> Result<Self> {
        let files_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(FILES_DIR);
        Self::with_directory(files_dir)
    }

    /// Store files under `files_dir`
    pub fn with_directory(files_dir: PathBuf) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("lesson-player/0.1.0")
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self::with_client(client, files_dir))
    }

    pub fn with_client(client: Client, files_dir: PathBuf) -> Self {
        Self { client, files_dir }
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.files_dir.join(urlencoding::encode(filename).as_ref())
    }

    async fn fetch_into(&self, url: &str, target: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                status
            )));
        }

        let mut file = fs::File::create(target).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| BridgeError::OperationFailed(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl DownloadStore for TokioDownloadStore {
    async fn exists(&self, filename: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(filename)).await?)
    }

    fn local_uri(&self, filename: &str) -> Option<String> {
        Some(self.path_for(filename).to_string_lossy().into_owned())
    }

    async fn download(&self, url: &str, filename: &str) -> Result<String> {
        fs::create_dir_all(&self.files_dir).await?;

        let target = self.path_for(filename);
        let partial = self
            .files_dir
            .join(format!("{}.part", urlencoding::encode(filename)));

        debug!(filename = filename, "Starting download");
        if let Err(e) = self.fetch_into(url, &partial).await {
            if let Err(cleanup) = fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %cleanup, "Failed to clean up partial download");
                }
            }
            return Err(e);
        }

        fs::rename(&partial, &target).await?;
        debug!(filename = filename, "Download complete");
        Ok(target.to_string_lossy().into_owned())
    }

    async fn remove(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.path_for(filename)).await {
            Ok(()) => {
                debug!(filename = filename, "Removed local file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}
