//! # Playback Error Types
//!
//! Error types for the audio session core.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The native engine failed to open or buffer a URI.
    #[error("Failed to load {uri}: {cause}")]
    Load { uri: String, cause: String },

    /// A control call (play, pause, seek, rate) failed on a live handle.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Playback rate outside the allowed set.
    #[error("Invalid playback rate: {0} (allowed: 1.0, 1.25, 1.5, 1.75, 2.0)")]
    InvalidPlaybackRate(f32),

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Key-value store read or write failed.
    ///
    /// Never escapes the position store; kept for logging.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Fetching an offline copy failed.
    #[error("Download of {track_id} failed: {cause}")]
    Download { track_id: String, cause: String },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reported by a host bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog document could not be parsed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Returns `true` if the error should be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            PlaybackError::Load { .. } | PlaybackError::Engine(_) | PlaybackError::Download { .. }
        )
    }

    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::Load { .. }
                | PlaybackError::Download { .. }
                | PlaybackError::Persistence(_)
                | PlaybackError::Io(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
