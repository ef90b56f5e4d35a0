//! Configuration
//!
//! Everything is optional in the JSON file; missing fields take the defaults
//! matching the original game's layout (three music channels, sequencer
//! channel table at `0x8011_3750`).

use crate::{MusicSwapError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of emulated music channels
pub const DEFAULT_CHANNEL_COUNT: usize = 3;
/// Default volume ceiling (0-100 scale)
pub const DEFAULT_GLOBAL_VOLUME: f32 = 100.0;

/// Substitution engine settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Process-wide volume ceiling applied when a replacement starts
    pub global_volume: f32,
    /// Number of music channels to track
    pub channel_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            global_volume: DEFAULT_GLOBAL_VOLUME,
            channel_count: DEFAULT_CHANNEL_COUNT,
        }
    }
}

/// Settings for silencing the original sequencer
///
/// Every `interval_frames` frames, `value` is written to
/// `table_base + i * stride` for each `i` in `first_entry..end_entry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MuteConfig {
    /// Whether muting runs at all
    pub enabled: bool,
    /// Address of the sequencer channel table
    pub table_base: u32,
    /// Size of one table entry in bytes
    pub stride: u32,
    /// First entry to overwrite
    pub first_entry: u32,
    /// One past the last entry to overwrite
    pub end_entry: u32,
    /// Word written to each entry
    pub value: u32,
    /// Frames between two mute passes
    pub interval_frames: u32,
}

impl Default for MuteConfig {
    fn default() -> Self {
        MuteConfig {
            enabled: true,
            table_base: 0x8011_3750,
            stride: 0x10,
            first_entry: 0x3,
            end_entry: 0x26,
            value: 0xFFFF_FFFF,
            interval_frames: 10,
        }
    }
}

impl MuteConfig {
    /// Addresses overwritten by one mute pass
    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        (self.first_entry..self.end_entry)
            .map(move |i| self.table_base.wrapping_add(i.wrapping_mul(self.stride)))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for replacement tracks
    pub music_dir: PathBuf,
    /// Engine settings
    pub engine: EngineConfig,
    /// Original engine muting
    pub mute: MuteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            music_dir: PathBuf::from("music"),
            engine: EngineConfig::default(),
            mute: MuteConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| MusicSwapError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            MusicSwapError::ConfigError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(0.0..=100.0).contains(&engine.global_volume) {
            return Err(MusicSwapError::ConfigError(format!(
                "global_volume {} outside 0-100",
                engine.global_volume
            )));
        }
        if engine.channel_count == 0 {
            return Err(MusicSwapError::ConfigError(
                "channel_count must be at least 1".into(),
            ));
        }

        let mute = &self.mute;
        if mute.interval_frames == 0 {
            return Err(MusicSwapError::ConfigError(
                "mute.interval_frames must be at least 1".into(),
            ));
        }
        if mute.enabled && mute.first_entry >= mute.end_entry {
            return Err(MusicSwapError::ConfigError(format!(
                "mute range {:#x}..{:#x} is empty",
                mute.first_entry, mute.end_entry
            )));
        }
        Ok(())
    }
}
