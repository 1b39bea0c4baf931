//! # Offline Library
//!
//! Single-file download, removal and status lookup for catalog items. Files
//! are always named `<id>.<extension>` so the session's local-first
//! resolution finds exactly what was downloaded here.

use bridge_traits::DownloadStore;
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus};
use core_runtime::logging::redact_url;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::TrackDescriptor;
use crate::error::{PlaybackError, Result};
use crate::resolver::local_filename;

/// Whether an item has a local copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub downloaded: bool,
    pub local_uri: Option<String>,
}

#[derive(Clone)]
pub struct OfflineLibrary {
    downloads: Arc<dyn DownloadStore>,
    events: EventBus,
    default_extension: String,
}

impl OfflineLibrary {
    pub fn new(
        downloads: Arc<dyn DownloadStore>,
        events: EventBus,
        default_extension: impl Into<String>,
    ) -> Self {
        Self {
            downloads,
            events,
            default_extension: default_extension.into(),
        }
    }

    fn filename(&self, descriptor: &TrackDescriptor) -> String {
        local_filename(descriptor, &self.default_extension)
    }

    /// Lookup failures read as "not downloaded".
    pub async fn status(&self, descriptor: &TrackDescriptor) -> FileStatus {
        let filename = self.filename(descriptor);
        let downloaded = match self.downloads.exists(&filename).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(error = %e, track_id = %descriptor.id, "Offline status lookup failed");
                false
            }
        };
        FileStatus {
            downloaded,
            local_uri: if downloaded {
                self.downloads.local_uri(&filename)
            } else {
                None
            },
        }
    }

    /// Fetch the remote file of `descriptor` and return its local URI.
    pub async fn download(&self, descriptor: &TrackDescriptor) -> Result<String> {
        let filename = self.filename(descriptor);
        let track_id = descriptor.id.clone();

        info!(track_id = %track_id, url = %redact_url(&descriptor.remote_url), "Downloading");
        self.emit(DownloadEvent::Started {
            track_id: track_id.clone(),
            filename: filename.clone(),
        });

        match self.downloads.download(&descriptor.remote_url, &filename).await {
            Ok(local_uri) => {
                self.emit(DownloadEvent::Completed {
                    track_id,
                    local_uri: local_uri.clone(),
                });
                Ok(local_uri)
            }
            Err(e) => {
                let cause = e.to_string();
                warn!(track_id = %track_id, error = %cause, "Download failed");
                self.emit(DownloadEvent::Failed {
                    track_id: track_id.clone(),
                    message: cause.clone(),
                });
                Err(PlaybackError::Download { track_id, cause })
            }
        }
    }

    /// Delete the local copy. Removing a file that is not there succeeds.
    pub async fn remove(&self, descriptor: &TrackDescriptor) -> Result<()> {
        let filename = self.filename(descriptor);
        self.downloads.remove(&filename).await?;
        self.emit(DownloadEvent::Removed {
            track_id: descriptor.id.clone(),
        });
        Ok(())
    }

    fn emit(&self, event: DownloadEvent) {
        self.events.emit(CoreEvent::Download(event)).ok();
    }
}

impl std::fmt::Debug for OfflineLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineLibrary")
            .field("default_extension", &self.default_extension)
            .finish_non_exhaustive()
    }
}
