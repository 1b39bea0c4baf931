//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the lesson player core:
//! - Logging and tracing infrastructure
//! - Host bridge configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback and service
//! crates depend on. It establishes the logging conventions, the fail-fast
//! bridge wiring, and the event broadcasting mechanism used throughout the
//! system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, HostPlatform};
pub use error::{Error, Result};
pub use events::{CoreEvent, DownloadEvent, EventBus, EventStream, PlaybackEvent};
