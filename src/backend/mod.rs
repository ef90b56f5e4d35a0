//! Playback Backends
//!
//! The substitution engine never touches audio data itself. It issues
//! commands against a [`PlaybackBackend`], which owns decoding, mixing and
//! output. All operations are expected to return within the frame budget.

pub mod recording;
#[cfg(feature = "streaming")]
pub mod rodio;

pub use recording::{BackendCommand, RecordingBackend};
#[cfg(feature = "streaming")]
pub use self::rodio::RodioBackend;

use crate::cache::AudioBuffer;
use crate::Result;

/// Loop region in seconds from the start of the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    /// Loop start (seconds)
    pub start: f64,
    /// Loop end (seconds)
    pub end: f64,
}

impl LoopRegion {
    /// Length of the looped section in seconds (zero if inverted)
    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Audio output driven by the substitution engine
///
/// Volumes use the original engine's 0-100 convention.
pub trait PlaybackBackend {
    /// Replacement instance bound to a channel
    type Handle;

    /// Create a playback instance for a buffer (not yet audible)
    fn start(&mut self, buffer: &AudioBuffer) -> Result<Self::Handle>;

    /// Begin playback of a prepared instance
    fn play(&mut self, handle: &Self::Handle) -> Result<()>;

    /// Stop playback
    fn stop(&mut self, handle: &Self::Handle);

    /// Free the instance's resources
    fn release(&mut self, handle: Self::Handle);

    /// Set playback volume (0-100 scale)
    fn set_volume(&mut self, handle: &Self::Handle, volume: f32);

    /// Enable or disable looping
    fn set_loop(&mut self, handle: &Self::Handle, enabled: bool);

    /// Restrict looping to a region instead of the whole track
    fn set_loop_bounds(&mut self, handle: &Self::Handle, region: LoopRegion);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_region_length() {
        let region = LoopRegion {
            start: 10.5,
            end: 42.0,
        };
        assert_eq!(region.length(), 31.5);

        let inverted = LoopRegion {
            start: 5.0,
            end: 1.0,
        };
        assert_eq!(inverted.length(), 0.0);
    }
}
