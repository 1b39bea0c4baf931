//! # Position Store
//!
//! Durable per-track resume offsets and the global playback speed, kept in
//! the host's key-value store.
//!
//! Every operation is fire-and-forget for callers: storage failures are
//! logged at `warn` and otherwise ignored. Losing a saved position only means
//! the track resumes from the start.

use bridge_traits::SettingsStore;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rate::PlaybackRate;

/// Namespace of per-track position keys.
pub const POSITION_KEY_PREFIX: &str = "audio_pos_";

/// Key of the global playback speed.
pub const PLAYBACK_SPEED_KEY: &str = "audio_playback_speed";

/// Settings key holding the saved offset of `uri`.
pub fn position_key(uri: &str) -> String {
    format!("{}{}", POSITION_KEY_PREFIX, urlencoding::encode(uri))
}

#[derive(Clone)]
pub struct PositionStore {
    settings: Arc<dyn SettingsStore>,
}

impl PositionStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    pub async fn save(&self, uri: &str, position_ms: u64) {
        let key = position_key(uri);
        if let Err(e) = self
            .settings
            .set_string(&key, &position_ms.to_string())
            .await
        {
            warn!(error = %e, key = %key, "Failed to save playback position");
        }
    }

    /// Saved offset of `uri`, or `None` when absent, unreadable or malformed.
    pub async fn load(&self, uri: &str) -> Option<u64> {
        let key = position_key(uri);
        let raw = match self.settings.get_string(&key).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, key = %key, "Failed to read playback position");
                return None;
            }
        };

        let parsed = parse_position(&raw);
        if parsed.is_none() {
            debug!(key = %key, value = %raw, "Ignoring malformed saved position");
        }
        parsed
    }

    pub async fn clear(&self, uri: &str) {
        let key = position_key(uri);
        if let Err(e) = self.settings.delete(&key).await {
            warn!(error = %e, key = %key, "Failed to clear playback position");
        }
    }

    pub async fn save_speed(&self, rate: PlaybackRate) {
        if let Err(e) = self
            .settings
            .set_string(PLAYBACK_SPEED_KEY, &rate.as_f32().to_string())
            .await
        {
            warn!(error = %e, "Failed to save playback speed");
        }
    }

    pub async fn load_speed(&self) -> Option<PlaybackRate> {
        let raw = match self.settings.get_string(PLAYBACK_SPEED_KEY).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Failed to read playback speed");
                return None;
            }
        };

        match raw.trim().parse::<f32>().map(PlaybackRate::new) {
            Ok(Ok(rate)) => Some(rate),
            _ => {
                debug!(value = %raw, "Ignoring unsupported saved playback speed");
                None
            }
        }
    }
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore").finish_non_exhaustive()
    }
}

/// Accepts integer or fractional milliseconds; rejects negative and non-finite values.
fn parse_position(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<u64>() {
        return Some(ms);
    }
    let ms = raw.parse::<f64>().ok()?;
    (ms.is_finite() && ms >= 0.0).then(|| ms.round() as u64)
}
