//! Substitution Engine
//!
//! Runs once per emulated frame. For every channel, in order:
//!
//! 1. Volume sync: while the same track keeps playing (on this frame and the
//!    last, so never on a start or restart frame), mirror the original
//!    engine's volume onto the replacement (0-100 scale) and duck it to a
//!    third while the game reports the channel paused.
//! 2. Transition: when a track starts or changes, release the current
//!    replacement and start the first cached track whose key id matches.
//! 3. Commit this frame's report as the previous-frame snapshot.
//!
//! Volume reports that scale above 100 leave the replacement volume as it
//! was. Ducking divides the current volume, so it compounds on frames where
//! the sync step did not reset it first. A replacement keeps playing after the
//! original track stops until the next transition supersedes it.

use crate::backend::PlaybackBackend;
use crate::cache::{CachedTrack, TrackCache};
use crate::channel::{ChannelReport, ChannelState, Replacement};
use crate::config::EngineConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Divisor applied to the replacement volume on paused frames
pub const PAUSE_DUCK_DIVISOR: f32 = 3.0;
/// Original engine volume to replacement volume scale
pub const VOLUME_SCALE: f32 = 100.0;

/// Per-frame music substitution driver
pub struct SubstitutionEngine<B: PlaybackBackend> {
    config: EngineConfig,
    cache: Arc<TrackCache>,
    backend: B,
    channels: Vec<ChannelState<B::Handle>>,
}

impl<B: PlaybackBackend> SubstitutionEngine<B> {
    /// Create an engine with `config.channel_count` idle channels
    pub fn new(config: EngineConfig, cache: Arc<TrackCache>, backend: B) -> Self {
        let channels = (0..config.channel_count).map(|_| ChannelState::new()).collect();
        SubstitutionEngine {
            config,
            cache,
            backend,
            channels,
        }
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Change the volume ceiling used for newly started replacements
    pub fn set_global_volume(&mut self, volume: f32) {
        self.config.global_volume = volume;
    }

    /// Shared track cache
    pub fn cache(&self) -> &Arc<TrackCache> {
        &self.cache
    }

    /// Playback backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable playback backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Channel states
    pub fn channels(&self) -> &[ChannelState<B::Handle>] {
        &self.channels
    }

    /// Number of tracked channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Run one frame, pulling each channel's report from `report_for`
    pub fn tick(&mut self, mut report_for: impl FnMut(usize) -> ChannelReport) {
        for index in 0..self.channels.len() {
            let report = report_for(index);
            self.process_channel(index, report);
        }
    }

    /// Run one frame from a slice of reports
    ///
    /// Channels without a report are treated as idle for this frame.
    pub fn tick_reports(&mut self, reports: &[ChannelReport]) {
        self.tick(|index| reports.get(index).copied().unwrap_or_default());
    }

    fn process_channel(&mut self, index: usize, report: ChannelReport) {
        let channel = &mut self.channels[index];
        channel.edge_mut().observe(report);

        if channel.edge().is_steady() {
            if let Some(active) = channel.active_mut() {
                sync_volume(&mut self.backend, active, &report);
            }
        }

        if channel.edge().is_transition() {
            if let Some(old) = channel.take_active() {
                debug!(channel = index, track = %old.track_name, "stopping replacement");
                self.backend.stop(&old.handle);
                self.backend.release(old.handle);
            }

            let snapshot = self.cache.all();
            match snapshot.find(report.track_id) {
                Some(track) => {
                    let volume = self.config.global_volume.min(report.volume);
                    if let Some(replacement) =
                        start_replacement(&mut self.backend, index, track, volume)
                    {
                        channel.bind(replacement);
                    }
                }
                None => debug!(
                    channel = index,
                    track_id = format_args!("{:#x}", report.track_id),
                    "no replacement cached"
                ),
            }
        }

        channel.edge_mut().commit();
    }
}

fn sync_volume<B: PlaybackBackend>(
    backend: &mut B,
    active: &mut Replacement<B::Handle>,
    report: &ChannelReport,
) {
    let mirrored = report.volume * VOLUME_SCALE;
    if mirrored <= VOLUME_SCALE {
        active.volume = mirrored;
        backend.set_volume(&active.handle, active.volume);
    }

    if report.paused {
        active.volume /= PAUSE_DUCK_DIVISOR;
        backend.set_volume(&active.handle, active.volume);
    }
}

fn start_replacement<B: PlaybackBackend>(
    backend: &mut B,
    channel: usize,
    track: &CachedTrack,
    volume: f32,
) -> Option<Replacement<B::Handle>> {
    let key = track.key().ok()?;

    let handle = match backend.start(track.buffer()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(channel, track = track.name(), "Failed to start replacement: {}", e);
            return None;
        }
    };

    if key.looping {
        backend.set_loop(&handle, true);
        if let Some(region) = key.loop_region {
            backend.set_loop_bounds(&handle, region);
        }
    }
    backend.set_volume(&handle, volume);

    if let Err(e) = backend.play(&handle) {
        warn!(channel, track = track.name(), "Failed to play replacement: {}", e);
        backend.release(handle);
        return None;
    }

    info!(
        channel,
        track = track.name(),
        track_id = format_args!("{:#x}", key.id),
        volume,
        looping = key.looping,
        "Playing replacement"
    );

    Some(Replacement {
        handle,
        track_name: track.name().to_string(),
        volume,
    })
}
