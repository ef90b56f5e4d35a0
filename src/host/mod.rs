//! Host Integration
//!
//! The emulator side of the replacement: reading the original engine's
//! channel state, silencing its sequencer, and driving everything once per
//! frame through a [`Session`].

pub mod interval;
pub mod script;

pub use interval::FrameInterval;
pub use script::{FrameScript, ScriptedBridge};

use crate::backend::PlaybackBackend;
use crate::cache::TrackCache;
use crate::channel::ChannelReport;
use crate::config::{Config, MuteConfig};
use crate::engine::SubstitutionEngine;
use std::sync::Arc;
use tracing::trace;

/// Access to the running game
pub trait CoreBridge {
    /// This frame's state of a music channel
    fn channel_report(&self, channel: usize) -> ChannelReport;

    /// Write a 32-bit word to emulated memory
    fn write_u32(&mut self, address: u32, value: u32);
}

/// Keeps the original sequencer silent by overwriting its channel table
#[derive(Debug, Clone)]
pub struct SequenceMuter {
    config: MuteConfig,
    interval: FrameInterval,
}

impl SequenceMuter {
    /// Create a muter from its settings
    pub fn new(config: MuteConfig) -> Self {
        SequenceMuter {
            interval: FrameInterval::new(config.interval_frames),
            config,
        }
    }

    /// Advance one frame; returns true if the table was overwritten
    pub fn tick(&mut self, bridge: &mut impl CoreBridge) -> bool {
        if !self.config.enabled || !self.interval.clock() {
            return false;
        }
        trace!(base = format_args!("{:#x}", self.config.table_base), "muting sequencer table");
        for address in self.config.addresses() {
            bridge.write_u32(address, self.config.value);
        }
        true
    }

    /// Number of mute passes performed
    pub fn passes(&self) -> u64 {
        self.interval.fire_count()
    }
}

/// Engine plus muter, driven by the host's frame loop
pub struct Session<B: PlaybackBackend> {
    engine: SubstitutionEngine<B>,
    muter: SequenceMuter,
    frame: u64,
}

impl<B: PlaybackBackend> Session<B> {
    /// Create a session over a populated (or still filling) cache
    pub fn new(config: &Config, cache: Arc<TrackCache>, backend: B) -> Self {
        Session {
            engine: SubstitutionEngine::new(config.engine, cache, backend),
            muter: SequenceMuter::new(config.mute),
            frame: 0,
        }
    }

    /// Run one frame: mute pass (when due), then substitution
    pub fn on_tick(&mut self, bridge: &mut impl CoreBridge) {
        self.frame += 1;
        self.muter.tick(bridge);
        self.engine.tick(|channel| bridge.channel_report(channel));
    }

    /// Frames processed so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Substitution engine
    pub fn engine(&self) -> &SubstitutionEngine<B> {
        &self.engine
    }

    /// Mutable substitution engine
    pub fn engine_mut(&mut self) -> &mut SubstitutionEngine<B> {
        &mut self.engine
    }

    /// Sequencer muter
    pub fn muter(&self) -> &SequenceMuter {
        &self.muter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeCore {
        reports: Vec<ChannelReport>,
        memory: HashMap<u32, u32>,
        writes: usize,
    }

    impl CoreBridge for FakeCore {
        fn channel_report(&self, channel: usize) -> ChannelReport {
            self.reports.get(channel).copied().unwrap_or_default()
        }

        fn write_u32(&mut self, address: u32, value: u32) {
            self.memory.insert(address, value);
            self.writes += 1;
        }
    }

    #[test]
    fn test_muter_writes_table_every_interval() {
        let mut core = FakeCore::default();
        let mut muter = SequenceMuter::new(MuteConfig::default());

        for _ in 0..9 {
            assert!(!muter.tick(&mut core));
        }
        assert!(muter.tick(&mut core));
        assert_eq!(core.writes, 0x23);
        assert_eq!(core.memory.get(&0x8011_3780), Some(&0xFFFF_FFFF));
        assert_eq!(core.memory.get(&0x8011_3770), None);

        for _ in 0..10 {
            muter.tick(&mut core);
        }
        assert_eq!(muter.passes(), 2);
    }

    #[test]
    fn test_disabled_muter_never_writes() {
        let mut core = FakeCore::default();
        let mut muter = SequenceMuter::new(MuteConfig {
            enabled: false,
            ..MuteConfig::default()
        });
        for _ in 0..50 {
            muter.tick(&mut core);
        }
        assert_eq!(core.writes, 0);
    }

    #[test]
    fn test_session_drives_engine_and_muter() {
        let cache = Arc::new(TrackCache::new());
        cache.put("2a-loop", vec![0u8; 8]);
        let mut session = Session::new(&Config::default(), cache, RecordingBackend::new());

        let mut core = FakeCore {
            reports: vec![ChannelReport::default(), ChannelReport::playing(0x2a, 0.7)],
            ..Default::default()
        };
        for _ in 0..10 {
            session.on_tick(&mut core);
        }

        assert_eq!(session.frame(), 10);
        assert_eq!(session.muter().passes(), 1);
        let channels = session.engine().channels();
        assert!(!channels[0].is_playing());
        assert!(channels[1].is_playing());
        assert!(!channels[2].is_playing());
    }
}
