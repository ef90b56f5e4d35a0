//! Scripted Host
//!
//! Replays a recorded or hand-written sequence of channel reports, standing in
//! for a live emulator. Scripts are JSON:
//!
//! ```json
//! { "frames": [
//!     { "repeat": 60, "channels": [ { "track_id": 42, "playing": true, "volume": 0.8 } ] },
//!     { "repeat": 30, "channels": [ { "track_id": 42, "playing": true, "paused": true, "volume": 0.8 } ] }
//! ] }
//! ```
//!
//! Channels missing from a frame report idle.

use super::CoreBridge;
use crate::channel::ChannelReport;
use crate::{MusicSwapError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn one() -> u32 {
    1
}

/// One script step, held for `repeat` frames
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFrame {
    /// Number of consecutive frames with this state
    #[serde(default = "one")]
    pub repeat: u32,
    /// Per-channel reports
    #[serde(default)]
    pub channels: Vec<ChannelReport>,
}

/// Sequence of script steps
#[derive(Debug, Clone, Deserialize)]
pub struct FrameScript {
    /// Steps in playback order
    pub frames: Vec<ScriptFrame>,
}

impl FrameScript {
    /// Parse a script from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MusicSwapError::ScriptError(e.to_string()))
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Total number of frames after expanding repeats
    pub fn total_frames(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }
}

/// [`CoreBridge`] replaying a [`FrameScript`]
#[derive(Debug)]
pub struct ScriptedBridge {
    script: FrameScript,
    step: usize,
    remaining: u32,
    writes: u64,
}

impl ScriptedBridge {
    /// Create a bridge positioned before the first frame
    pub fn new(script: FrameScript) -> Self {
        ScriptedBridge {
            script,
            step: 0,
            remaining: 0,
            writes: 0,
        }
    }

    /// Move to the next frame; false once the script is exhausted
    pub fn advance(&mut self) -> bool {
        if self.remaining > 1 {
            self.remaining -= 1;
            return true;
        }
        if self.remaining == 1 {
            self.step += 1;
        }
        while let Some(frame) = self.script.frames.get(self.step) {
            if frame.repeat > 0 {
                self.remaining = frame.repeat;
                return true;
            }
            self.step += 1;
        }
        self.remaining = 0;
        false
    }

    /// Memory writes received so far
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Total frames in the underlying script
    pub fn total_frames(&self) -> u64 {
        self.script.total_frames()
    }
}

impl CoreBridge for ScriptedBridge {
    fn channel_report(&self, channel: usize) -> ChannelReport {
        if self.remaining == 0 {
            return ChannelReport::default();
        }
        self.script
            .frames
            .get(self.step)
            .and_then(|f| f.channels.get(channel))
            .copied()
            .unwrap_or_default()
    }

    fn write_u32(&mut self, _address: u32, _value: u32) {
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{ "frames": [
        { "repeat": 2, "channels": [ { "track_id": 42, "playing": true, "volume": 0.8 } ] },
        { "repeat": 0, "channels": [ { "track_id": 1, "playing": true } ] },
        { "channels": [ {}, { "track_id": 7, "playing": true, "paused": true, "volume": 0.5 } ] }
    ] }"#;

    #[test]
    fn test_parse_defaults() {
        let script = FrameScript::from_json(SCRIPT).unwrap();
        assert_eq!(script.frames.len(), 3);
        assert_eq!(script.frames[2].repeat, 1);
        assert_eq!(script.total_frames(), 3);
        let ch = script.frames[0].channels[0];
        assert!(ch.playing && !ch.paused);
    }

    #[test]
    fn test_bridge_replays_frames() {
        let mut bridge = ScriptedBridge::new(FrameScript::from_json(SCRIPT).unwrap());

        assert!(bridge.advance());
        assert_eq!(bridge.channel_report(0).track_id, 42);
        assert!(bridge.advance());
        assert_eq!(bridge.channel_report(0).track_id, 42);

        // Zero-repeat step is skipped
        assert!(bridge.advance());
        assert!(!bridge.channel_report(0).playing);
        let ch1 = bridge.channel_report(1);
        assert_eq!(ch1.track_id, 7);
        assert!(ch1.paused);
        assert_eq!(bridge.channel_report(2), ChannelReport::default());

        assert!(!bridge.advance());
        assert!(!bridge.advance());
        assert_eq!(bridge.channel_report(1), ChannelReport::default());
    }

    #[test]
    fn test_counts_writes() {
        let mut bridge = ScriptedBridge::new(FrameScript { frames: vec![] });
        bridge.write_u32(0x8011_3780, 0xFFFF_FFFF);
        assert_eq!(bridge.writes(), 1);
        assert!(!bridge.advance());
    }

    #[test]
    fn test_malformed_script() {
        assert!(matches!(
            FrameScript::from_json(r#"{ "frames": 3 }"#),
            Err(MusicSwapError::ScriptError(_))
        ));
    }
}
