//! # Session Configuration
//!
//! Tunables for the audio session controller.

use bridge_traits::{AudioSessionOptions, LoadOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Session controller configuration.
///
/// Every field has a serde default so hosts can ship a partial JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often the native player reports status while a track is loaded.
    ///
    /// Default: 200 ms. Must be within (0, 1s].
    #[serde(default = "default_status_interval")]
    pub status_interval: Duration,

    /// How often the position of a playing track is persisted.
    ///
    /// Default: 1 second.
    #[serde(default = "default_position_save_interval")]
    pub position_save_interval: Duration,

    /// Title used when a URI matches nothing in the queue.
    ///
    /// Default: "Audio".
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,

    /// Extension used for local filenames when a descriptor carries none.
    ///
    /// Default: "mp3".
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// Hosts that refuse inline streaming in a browser.
    ///
    /// On the web platform a load failure for one of these hosts is reported
    /// as "open externally" instead of a plain error.
    #[serde(default = "default_restricted_stream_hosts")]
    pub restricted_stream_hosts: Vec<String>,

    /// Keep playing while the app is backgrounded.
    #[serde(default = "default_true")]
    pub background_playback: bool,

    /// Lower other apps' audio instead of interrupting it.
    #[serde(default = "default_true")]
    pub duck_others: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            status_interval: default_status_interval(),
            position_save_interval: default_position_save_interval(),
            fallback_title: default_fallback_title(),
            default_extension: default_extension(),
            restricted_stream_hosts: default_restricted_stream_hosts(),
            background_playback: true,
            duck_others: true,
        }
    }
}

impl SessionConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.status_interval.is_zero() {
            return Err(PlaybackError::Config(
                "status_interval must be > 0".to_string(),
            ));
        }

        if self.status_interval > Duration::from_secs(1) {
            return Err(PlaybackError::Config(
                "status_interval cannot exceed 1 second".to_string(),
            ));
        }

        if self.position_save_interval.is_zero() {
            return Err(PlaybackError::Config(
                "position_save_interval must be > 0".to_string(),
            ));
        }

        if self.default_extension.is_empty() || self.default_extension.contains('.') {
            return Err(PlaybackError::Config(
                "default_extension must be a bare extension such as \"mp3\"".to_string(),
            ));
        }

        Ok(())
    }

    /// Options passed to every native load.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            progress_update_interval: self.status_interval,
            should_play: false,
            correct_pitch: true,
        }
    }

    /// Process-wide audio session behavior.
    pub fn audio_session_options(&self) -> AudioSessionOptions {
        AudioSessionOptions {
            stays_active_in_background: self.background_playback,
            duck_others: self.duck_others,
        }
    }

    /// Returns `true` if `url` points at a host listed in `restricted_stream_hosts`.
    pub fn is_restricted_stream(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        self.restricted_stream_hosts
            .iter()
            .any(|restricted| host.eq_ignore_ascii_case(restricted))
    }
}

/// Extract the host part of an HTTP(S) URL.
fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_status_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_position_save_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_fallback_title() -> String {
    "Audio".to_string()
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_restricted_stream_hosts() -> Vec<String> {
    vec!["drive.google.com".to_string()]
}

fn default_true() -> bool {
    true
}
