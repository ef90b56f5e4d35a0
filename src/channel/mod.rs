//! Per-Channel State
//!
//! The host exposes no "track changed" event. Each channel keeps the state
//! reported on the previous frame next to the one reported on the current
//! frame; edges are derived by comparing the two.

use serde::Deserialize;

/// State of one music channel as reported by the original engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ChannelReport {
    /// Track id the game wants on this channel
    pub track_id: u32,
    /// Whether the original engine is playing the channel
    pub playing: bool,
    /// Whether the original engine has the channel paused
    pub paused: bool,
    /// Original engine volume (nominally 0.0-1.0)
    pub volume: f32,
}

impl ChannelReport {
    /// Report for a track that is playing, unpaused
    pub fn playing(track_id: u32, volume: f32) -> Self {
        ChannelReport {
            track_id,
            playing: true,
            paused: false,
            volume,
        }
    }

    /// Same report with the pause flag set
    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }
}

/// Part of a report that is remembered across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeState {
    /// Track id
    pub track_id: u32,
    /// Playing flag
    pub playing: bool,
}

/// Previous-vs-current comparison for one channel
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    previous: EdgeState,
    current: ChannelReport,
}

impl EdgeDetector {
    /// Create a detector that has seen nothing yet (previous = not playing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's report; the previous snapshot is left untouched
    pub fn observe(&mut self, report: ChannelReport) {
        self.current = report;
    }

    /// Remembered state of the previous frame
    pub fn previous(&self) -> &EdgeState {
        &self.previous
    }

    /// Same track playing on both this frame and the last
    pub fn is_steady(&self) -> bool {
        self.previous.playing
            && self.current.playing
            && self.previous.track_id == self.current.track_id
    }

    /// A track started or changed while playing
    pub fn is_transition(&self) -> bool {
        let changed = !self.previous.playing || self.previous.track_id != self.current.track_id;
        changed && self.current.playing
    }

    /// End of frame: current becomes previous
    pub fn commit(&mut self) {
        self.previous = EdgeState {
            track_id: self.current.track_id,
            playing: self.current.playing,
        };
    }
}

/// A replacement bound to a channel, with its last applied volume
#[derive(Debug)]
pub struct Replacement<H> {
    /// Backend handle
    pub handle: H,
    /// Cache key the replacement was started from
    pub track_name: String,
    /// Volume last sent to the backend (0-100 scale)
    pub volume: f32,
}

/// Mutable record for one music channel
#[derive(Debug)]
pub struct ChannelState<H> {
    edge: EdgeDetector,
    active: Option<Replacement<H>>,
}

impl<H> Default for ChannelState<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ChannelState<H> {
    /// Create an idle channel
    pub fn new() -> Self {
        ChannelState {
            edge: EdgeDetector::new(),
            active: None,
        }
    }

    /// Edge detector
    pub fn edge(&self) -> &EdgeDetector {
        &self.edge
    }

    /// Mutable edge detector
    pub fn edge_mut(&mut self) -> &mut EdgeDetector {
        &mut self.edge
    }

    /// Currently bound replacement
    pub fn active(&self) -> Option<&Replacement<H>> {
        self.active.as_ref()
    }

    /// Mutable access to the bound replacement
    pub fn active_mut(&mut self) -> Option<&mut Replacement<H>> {
        self.active.as_mut()
    }

    /// Unbind the replacement, handing ownership to the caller
    pub fn take_active(&mut self) -> Option<Replacement<H>> {
        self.active.take()
    }

    /// Bind a new replacement; the slot must be empty
    pub fn bind(&mut self, replacement: Replacement<H>) {
        debug_assert!(self.active.is_none(), "previous replacement not released");
        self.active = Some(replacement);
    }

    /// Whether a replacement is bound
    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }
}
