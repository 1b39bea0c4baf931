//! # Playback Session Module
//!
//! The audio core of the lesson player.
//!
//! ## Overview
//!
//! This crate handles:
//! - The lesson catalog model and the per-session queue
//! - Durable resume positions and the global playback speed
//! - Local-first resolution of playable URIs
//! - A single-handle adapter over the host's native audio player
//! - The session state machine driven by the UI
//! - Single-file offline downloads
//!
//! ## Layers
//!
//! ```text
//! SessionController
//!   ├── PositionStore   (SettingsStore bridge)
//!   ├── TrackResolver   (DownloadStore bridge)
//!   └── PlaybackEngine  (NativeAudioPlayer bridge)
//! OfflineLibrary        (DownloadStore bridge)
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod offline;
pub mod position_store;
pub mod rate;
pub mod resolver;
pub mod session;

pub use catalog::{Catalog, Category, MediaKind, TrackDescriptor};
pub use config::SessionConfig;
pub use engine::{EngineStatus, LoadOutcome, LoadTicket, PlaybackEngine, StatusSnapshot};
pub use error::{PlaybackError, Result};
pub use offline::{FileStatus, OfflineLibrary};
pub use position_store::PositionStore;
pub use rate::{PlaybackRate, ALLOWED_RATES};
pub use resolver::{local_filename, TrackMetadata, TrackResolver};
pub use session::{PlayRequest, SessionController, SessionPhase, SessionSnapshot};
