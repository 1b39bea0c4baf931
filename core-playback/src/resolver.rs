//! # Track Resolver
//!
//! Answers two questions for the session controller: what is the title and
//! stable id of a URI that is about to play, and which URI should be played
//! for a catalog descriptor (the offline copy when one exists).

use bridge_traits::DownloadStore;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::TrackDescriptor;

/// Local filename of a descriptor's offline copy: `<id>.<extension>`.
///
/// Derived from the id only; display names may be non-ASCII or repeated.
pub fn local_filename(descriptor: &TrackDescriptor, default_extension: &str) -> String {
    let extension = descriptor
        .file_extension
        .as_deref()
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .unwrap_or(default_extension);
    format!("{}.{}", descriptor.id, extension)
}

/// Display metadata for a URI about to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub track_id: Option<String>,
}

#[derive(Clone)]
pub struct TrackResolver {
    downloads: Arc<dyn DownloadStore>,
    fallback_title: String,
    default_extension: String,
}

impl TrackResolver {
    pub fn new(
        downloads: Arc<dyn DownloadStore>,
        fallback_title: impl Into<String>,
        default_extension: impl Into<String>,
    ) -> Self {
        Self {
            downloads,
            fallback_title: fallback_title.into(),
            default_extension: default_extension.into(),
        }
    }

    pub fn filename_for(&self, descriptor: &TrackDescriptor) -> String {
        local_filename(descriptor, &self.default_extension)
    }

    /// Find `uri` (or `track_id`) in `queue`.
    ///
    /// Matches by id first, then by URI against both the remote URL and the
    /// local URI of each descriptor. Unknown URIs get the fallback title and
    /// no id; playback still proceeds.
    pub fn resolve_metadata(
        &self,
        queue: &[TrackDescriptor],
        uri: &str,
        track_id: Option<&str>,
    ) -> TrackMetadata {
        let by_id = track_id.and_then(|id| queue.iter().find(|d| d.id == id));
        let found = by_id.or_else(|| queue.iter().find(|d| self.matches_uri(d, uri)));

        match found {
            Some(descriptor) => TrackMetadata {
                title: descriptor.name.clone(),
                track_id: Some(descriptor.id.clone()),
            },
            None => TrackMetadata {
                title: self.fallback_title.clone(),
                track_id: track_id.map(str::to_string),
            },
        }
    }

    /// Whether `uri` refers to `descriptor`, either remote or offline.
    pub fn matches_uri(&self, descriptor: &TrackDescriptor, uri: &str) -> bool {
        if descriptor.remote_url == uri {
            return true;
        }
        self.downloads
            .local_uri(&self.filename_for(descriptor))
            .is_some_and(|local| local == uri)
    }

    /// URI to play for `descriptor`: the offline copy if present, else the remote URL.
    pub async fn resolve_playback_uri(&self, descriptor: &TrackDescriptor) -> String {
        let filename = self.filename_for(descriptor);
        match self.downloads.exists(&filename).await {
            Ok(true) => {
                if let Some(local) = self.downloads.local_uri(&filename) {
                    debug!(track_id = %descriptor.id, "Using offline copy");
                    return local;
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, track_id = %descriptor.id, "Offline lookup failed, streaming instead");
            }
        }
        descriptor.remote_url.clone()
    }
}

impl std::fmt::Debug for TrackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackResolver")
            .field("fallback_title", &self.fallback_title)
            .field("default_extension", &self.default_extension)
            .finish()
    }
}
