//! Playback speed values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PlaybackError, Result};

/// Speeds the session accepts, in cycling order.
pub const ALLOWED_RATES: [f32; 5] = [1.0, 1.25, 1.5, 1.75, 2.0];

/// A playback speed multiplier restricted to [`ALLOWED_RATES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);

    /// Validate `rate` against the allowed set.
    ///
    /// Values within 0.001 of an allowed rate are snapped to it, so a rate
    /// read back from text storage compares equal.
    pub fn new(rate: f32) -> Result<Self> {
        ALLOWED_RATES
            .iter()
            .copied()
            .find(|allowed| (allowed - rate).abs() < 1e-3)
            .map(PlaybackRate)
            .ok_or(PlaybackError::InvalidPlaybackRate(rate))
    }

    pub fn as_f32(self) -> f32 {
        self.0
    }

    /// The next faster rate, wrapping from 2.0 back to 1.0.
    pub fn next(self) -> Self {
        let index = ALLOWED_RATES
            .iter()
            .position(|allowed| *allowed == self.0)
            .unwrap_or(0);
        PlaybackRate(ALLOWED_RATES[(index + 1) % ALLOWED_RATES.len()])
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f32> for PlaybackRate {
    type Error = PlaybackError;

    fn try_from(value: f32) -> Result<Self> {
        PlaybackRate::new(value)
    }
}

impl From<PlaybackRate> for f32 {
    fn from(rate: PlaybackRate) -> Self {
        rate.0
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}
