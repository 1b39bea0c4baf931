//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the lesson player core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per platform
//! (desktop, iOS, Android, web).
//!
//! ## Traits
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//! - [`DownloadStore`](storage::DownloadStore) - Offline copies of lesson files
//!
//! ### Audio
//! - [`NativeAudioPlayer`](playback::NativeAudioPlayer) - The host's audio engine
//! - [`PlayerStatusListener`](playback::PlayerStatusListener) - Status callbacks from that engine
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Storage only |
//! | iOS      | host app            | 📋 Planned |
//! | Android  | host app            | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and include context (file names, URLs) in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared across async tasks behind an `Arc`.

pub mod error;
pub mod log;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    AudioSessionOptions, LoadOptions, NativeAudioPlayer, NativeHandleId, PlayerStatus,
    PlayerStatusListener,
};
pub use storage::{DownloadStore, SettingsStore};
