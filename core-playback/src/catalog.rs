//! # Lesson Catalog
//!
//! Static, build-time list of playable items grouped into categories. The
//! catalog is read-only to the audio core; it only provides the fallback
//! queue and descriptors for offline lookups.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of media a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    /// PDF documents; never enter the playback queue.
    #[serde(rename = "pdf", alias = "document")]
    Document,
}

/// One playable or viewable item of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Unique within the catalog.
    pub id: String,
    /// Display name. May be non-ASCII and is not guaranteed unique.
    pub name: String,
    #[serde(rename = "type", alias = "media_kind")]
    pub media_kind: MediaKind,
    #[serde(rename = "url", alias = "remote_url")]
    pub remote_url: String,
    #[serde(
        rename = "extension",
        alias = "file_extension",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_extension: Option<String>,
}

impl TrackDescriptor {
    pub fn audio(
        id: impl Into<String>,
        name: impl Into<String>,
        remote_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            media_kind: MediaKind::Audio,
            remote_url: remote_url.into(),
            file_extension: None,
        }
    }

    pub fn document(
        id: impl Into<String>,
        name: impl Into<String>,
        remote_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            media_kind: MediaKind::Document,
            remote_url: remote_url.into(),
            file_extension: Some("pdf".to_string()),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    pub fn is_audio(&self) -> bool {
        self.media_kind == MediaKind::Audio
    }
}

/// A named group of descriptors, e.g. one lesson series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub files: Vec<TrackDescriptor>,
}

impl Category {
    /// Audio descriptors of this category in catalog order.
    ///
    /// This is the queue a screen passes when the user starts a lesson.
    pub fn audio_queue(&self) -> Vec<TrackDescriptor> {
        self.files.iter().filter(|d| d.is_audio()).cloned().collect()
    }
}

/// The full catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Parse a catalog from a JSON array of categories.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Look up a descriptor by id across all categories.
    pub fn find(&self, track_id: &str) -> Option<&TrackDescriptor> {
        self.categories
            .iter()
            .flat_map(|c| c.files.iter())
            .find(|d| d.id == track_id)
    }

    /// Every audio descriptor of the catalog, category by category.
    ///
    /// Used as the session queue when a caller supplies none.
    pub fn audio_tracks(&self) -> Vec<TrackDescriptor> {
        self.categories
            .iter()
            .flat_map(|c| c.files.iter())
            .filter(|d| d.is_audio())
            .cloned()
            .collect()
    }
}
