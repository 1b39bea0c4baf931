//! # Core Configuration Module
//!
//! Provides configuration management for the lesson player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges the audio core needs. It enforces
//! fail-fast validation so that a missing bridge is reported at startup with an
//! actionable message, not as a confusing failure on first playback.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Persists playback positions and the global speed
//! - `DownloadStore` - Answers "is this lesson available offline, and where"
//! - `NativeAudioPlayer` - The host's audio engine
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, HostPlatform};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .download_store(Arc::new(MyDownloadStore))
//!     .audio_player(Arc::new(MyNativePlayer))
//!     .platform(HostPlatform::Native)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with a message naming the missing SettingsStore bridge
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{DownloadStore, NativeAudioPlayer, SettingsStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Host platform family.
///
/// Some behavior differs on the web build: browsers refuse to stream from
/// certain file hosts inline, and there is no writable download area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    /// iOS, Android or desktop
    #[default]
    Native,
    /// Browser build
    Web,
}

impl HostPlatform {
    pub fn is_web(&self) -> bool {
        matches!(self, HostPlatform::Web)
    }
}

/// Core configuration for the lesson player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Key-value preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Offline download area (required)
    pub download_store: Arc<dyn DownloadStore>,

    /// Native audio engine (required)
    pub audio_player: Arc<dyn NativeAudioPlayer>,

    /// Platform family the core runs on
    pub platform: HostPlatform,

    /// Buffer size of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings_store", &"SettingsStore { ... }")
            .field("download_store", &"DownloadStore { ... }")
            .field("audio_player", &"NativeAudioPlayer { ... }")
            .field("platform", &self.platform)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > 10_000 {
            return Err(Error::Config(
                "Event buffer size exceeds maximum of 10,000 events".to_string(),
            ));
        }

        Ok(())
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required to persist playback positions and speed. \
                 Desktop: use bridge_desktop::SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore). \
                 Web: inject a localStorage-based settings store."
            .to_string(),
    }
}

fn download_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "DownloadStore".to_string(),
        message: "DownloadStore implementation is required to resolve offline copies. \
                 Desktop: use bridge_desktop::TokioDownloadStore. \
                 Mobile: inject the app's document-directory download manager."
            .to_string(),
    }
}

fn audio_player_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NativeAudioPlayer".to_string(),
        message: "NativeAudioPlayer implementation is required for playback. \
                 Mobile: wrap AVPlayer/ExoPlayer. Web: wrap an HTML audio element."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings_store: Option<Arc<dyn SettingsStore>>,
    download_store: Option<Arc<dyn DownloadStore>>,
    audio_player: Option<Arc<dyn NativeAudioPlayer>>,
    platform: HostPlatform,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the download store implementation (required).
    pub fn download_store(mut self, store: Arc<dyn DownloadStore>) -> Self {
        self.download_store = Some(store);
        self
    }

    /// Sets the native audio player implementation (required).
    pub fn audio_player(mut self, player: Arc<dyn NativeAudioPlayer>) -> Self {
        self.audio_player = Some(player);
        self
    }

    /// Sets the host platform.
    ///
    /// Default: [`HostPlatform::Native`]
    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns [`Error::CapabilityMissing`] naming the first missing bridge, or
    /// [`Error::Config`] if a value is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;
        let download_store = self
            .download_store
            .ok_or_else(download_store_missing_error)?;
        let audio_player = self.audio_player.ok_or_else(audio_player_missing_error)?;

        let config = CoreConfig {
            settings_store,
            download_store,
            audio_player,
            platform: self.platform,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
