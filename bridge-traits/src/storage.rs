//! Storage Abstractions
//!
//! Provides platform-agnostic traits for key-value settings storage and for
//! the offline download area that holds fetched lesson files.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences/settings storage:
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
/// - Desktop: SQLite-backed key-value table
/// - Web: localStorage / IndexedDB
///
/// Values are plain strings; callers own the encoding of numbers.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_rate(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("audio_playback_speed", "1.5").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value, replacing any previous value for `key`
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Offline download area trait
///
/// Abstracts the host's file download/cache SDK:
/// - iOS/Android: app document directory
/// - Desktop: `<data_dir>/files/`
/// - Web: a download registry kept in settings, files stay remote
///
/// Files are addressed by a logical filename chosen by the caller. The core
/// always derives that name from a stable track identifier, never from a
/// display name.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::DownloadStore;
///
/// async fn playable_uri(store: &dyn DownloadStore, remote: &str) -> Result<String> {
///     if store.exists("lesson-1.mp3").await? {
///         if let Some(local) = store.local_uri("lesson-1.mp3") {
///             return Ok(local);
///         }
///     }
///     Ok(remote.to_string())
/// }
/// ```
#[async_trait]
pub trait DownloadStore: Send + Sync {
    /// Check whether a local copy of `filename` exists
    async fn exists(&self, filename: &str) -> Result<bool>;

    /// Local URI the file has (or would have) once downloaded
    ///
    /// Returns `None` when the platform has no writable download area.
    fn local_uri(&self, filename: &str) -> Option<String>;

    /// Fetch `url` into the download area under `filename`
    ///
    /// Returns the local URI of the stored file.
    async fn download(&self, url: &str, filename: &str) -> Result<String>;

    /// Remove the local copy of `filename`. Removing a missing file is not an error.
    async fn remove(&self, filename: &str) -> Result<()>;
}
