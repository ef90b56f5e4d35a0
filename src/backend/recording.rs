//! Command-recording backend
//!
//! Produces no audio. Every command is appended to a log and the last known
//! state of each handle is tracked, which makes the engine's decisions
//! observable for dry runs and tests.

use super::{LoopRegion, PlaybackBackend};
use crate::cache::AudioBuffer;
use crate::Result;
use std::collections::HashMap;
use std::fmt;

/// One command issued to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Instance created for a buffer of the given length
    Start {
        /// Handle id
        handle: u64,
        /// Buffer length in bytes
        len: usize,
    },
    /// Playback begun
    Play(u64),
    /// Playback stopped
    Stop(u64),
    /// Instance freed
    Release(u64),
    /// Volume changed
    SetVolume(u64, f32),
    /// Loop mode changed
    SetLoop(u64, bool),
    /// Loop region applied
    SetLoopBounds(u64, LoopRegion),
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendCommand::Start { handle, len } => write!(f, "start #{handle} ({len} bytes)"),
            BackendCommand::Play(h) => write!(f, "play #{h}"),
            BackendCommand::Stop(h) => write!(f, "stop #{h}"),
            BackendCommand::Release(h) => write!(f, "release #{h}"),
            BackendCommand::SetVolume(h, v) => write!(f, "volume #{h} = {v:.2}"),
            BackendCommand::SetLoop(h, on) => write!(f, "loop #{h} = {on}"),
            BackendCommand::SetLoopBounds(h, r) => {
                write!(f, "loop bounds #{h} = {:.3}s..{:.3}s", r.start, r.end)
            }
        }
    }
}

/// Last known state of a recorded handle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleState {
    /// Last volume set
    pub volume: f32,
    /// Loop flag
    pub looping: bool,
    /// Loop region, if one was applied
    pub loop_region: Option<LoopRegion>,
    /// Whether `play` was issued and no `stop` since
    pub playing: bool,
}

/// Backend that records commands instead of producing sound
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    commands: Vec<BackendCommand>,
    handles: HashMap<u64, HandleState>,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands issued so far, oldest first
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// State of a live (not yet released) handle
    pub fn handle_state(&self, handle: u64) -> Option<&HandleState> {
        self.handles.get(&handle)
    }

    /// Number of live handles
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    /// Number of recorded commands matching a predicate
    pub fn count(&self, pred: impl Fn(&BackendCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn state_mut(&mut self, handle: u64) -> Option<&mut HandleState> {
        self.handles.get_mut(&handle)
    }
}

impl PlaybackBackend for RecordingBackend {
    type Handle = u64;

    fn start(&mut self, buffer: &AudioBuffer) -> Result<u64> {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.handles.insert(handle, HandleState::default());
        self.commands.push(BackendCommand::Start {
            handle,
            len: buffer.len(),
        });
        Ok(handle)
    }

    fn play(&mut self, handle: &u64) -> Result<()> {
        if let Some(state) = self.state_mut(*handle) {
            state.playing = true;
        }
        self.commands.push(BackendCommand::Play(*handle));
        Ok(())
    }

    fn stop(&mut self, handle: &u64) {
        if let Some(state) = self.state_mut(*handle) {
            state.playing = false;
        }
        self.commands.push(BackendCommand::Stop(*handle));
    }

    fn release(&mut self, handle: u64) {
        self.handles.remove(&handle);
        self.commands.push(BackendCommand::Release(handle));
    }

    fn set_volume(&mut self, handle: &u64, volume: f32) {
        if let Some(state) = self.state_mut(*handle) {
            state.volume = volume;
        }
        self.commands.push(BackendCommand::SetVolume(*handle, volume));
    }

    fn set_loop(&mut self, handle: &u64, enabled: bool) {
        if let Some(state) = self.state_mut(*handle) {
            state.looping = enabled;
        }
        self.commands.push(BackendCommand::SetLoop(*handle, enabled));
    }

    fn set_loop_bounds(&mut self, handle: &u64, region: LoopRegion) {
        if let Some(state) = self.state_mut(*handle) {
            state.loop_region = Some(region);
        }
        self.commands
            .push(BackendCommand::SetLoopBounds(*handle, region));
    }
}
