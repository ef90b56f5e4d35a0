//! Game Music Replacement Engine
//!
//! Substitutes the sequenced background music of a running game with externally
//! supplied audio files. The host game never announces track changes, so the
//! engine polls each music channel once per frame, diffs the polled state against
//! the previous frame, and drives a playback backend accordingly.
//!
//! # Features
//! - Track cache fed by a recursive music directory scan and by pushed tracks
//! - Cache key grammar `<hex-id>[-loop[-<start>-<end>]]` with loop regions
//! - Per-channel edge detection (track change, start of playback)
//! - Volume mirroring of the original engine, with ducking while paused
//! - Periodic muting of the original sequencer's channel table
//! - Optional real-time output through rodio
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ```no_run
//! use std::sync::Arc;
//! use musicswap::backend::RecordingBackend;
//! use musicswap::channel::ChannelReport;
//! use musicswap::{EngineConfig, SubstitutionEngine, TrackCache};
//!
//! let cache = Arc::new(TrackCache::new());
//! cache.put("2a-loop-10.5-42.0", vec![0u8; 16]);
//!
//! let mut engine =
//!     SubstitutionEngine::new(EngineConfig::default(), Arc::clone(&cache), RecordingBackend::new());
//! engine.tick_reports(&[ChannelReport::playing(0x2a, 0.8)]);
//! ```

#![warn(missing_docs)]

pub mod backend; // Playback Backends
pub mod cache; // Track Cache & Loaders
pub mod channel; // Per-Channel State
pub mod config; // Configuration
pub mod engine; // Substitution Engine
pub mod host; // Host Bridge, Muting & Sessions
pub mod key; // Cache Key Grammar

/// Error types for music replacement operations
#[derive(thiserror::Error, Debug)]
pub enum MusicSwapError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio buffer could not be decoded by the backend
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed frame script
    #[error("Frame script error: {0}")]
    ScriptError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for MusicSwapError {
    /// Converts a String into `MusicSwapError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `Decode`, ...) where the
    /// failure kind is known.
    fn from(msg: String) -> Self {
        MusicSwapError::Other(msg)
    }
}

impl From<&str> for MusicSwapError {
    /// Converts a string slice into `MusicSwapError::Other`.
    fn from(msg: &str) -> Self {
        MusicSwapError::Other(msg.to_string())
    }
}

/// Result type for music replacement operations
pub type Result<T> = std::result::Result<T, MusicSwapError>;

// Public API exports
pub use backend::{BackendCommand, LoopRegion, PlaybackBackend, RecordingBackend};
#[cfg(feature = "streaming")]
pub use backend::RodioBackend;
pub use cache::{ensure_music_dir, AudioBuffer, CachedTrack, DirectoryLoader, PushedTrack, TrackCache, TrackPusher};
pub use channel::{ChannelReport, ChannelState, EdgeDetector};
pub use config::{Config, EngineConfig, MuteConfig};
pub use engine::SubstitutionEngine;
pub use host::{CoreBridge, FrameInterval, FrameScript, ScriptedBridge, SequenceMuter, Session};
pub use key::{KeyError, TrackKey};
