//! Real-time playback using rodio
//!
//! Each replacement gets its own [`Sink`] on a shared output stream. Loop
//! regions are realised as an intro segment (track start up to the loop end)
//! followed by the `[start, end)` section repeated forever.

use super::{LoopRegion, PlaybackBackend};
use crate::cache::AudioBuffer;
use crate::{MusicSwapError, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::cell::Cell;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// Replacement instance playing through rodio
pub struct RodioTrack {
    sink: Sink,
    buffer: AudioBuffer,
    looping: Cell<bool>,
    region: Cell<Option<LoopRegion>>,
}

/// Playback backend writing to the default audio device
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            MusicSwapError::AudioDeviceError(format!("Failed to create audio stream: {}", e))
        })?;

        Ok(RodioBackend {
            _stream: stream,
            stream_handle,
        })
    }
}

fn decode(buffer: &AudioBuffer) -> Result<Decoder<Cursor<AudioBuffer>>> {
    Decoder::new(Cursor::new(buffer.clone())).map_err(|e| MusicSwapError::Decode(e.to_string()))
}

/// Playback position for a loop bound; `None` if it cannot be represented
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value.max(0.0)).ok()
}

/// Intro length, loop start and loop length for a usable region
fn loop_section(region: LoopRegion) -> Option<(Duration, Duration, Duration)> {
    if region.length() <= 0.0 {
        return None;
    }
    Some((
        seconds(region.end)?,
        seconds(region.start)?,
        seconds(region.length())?,
    ))
}

impl PlaybackBackend for RodioBackend {
    type Handle = RodioTrack;

    fn start(&mut self, buffer: &AudioBuffer) -> Result<RodioTrack> {
        // Check the format up front so undecodable buffers never bind a handle
        decode(buffer)?;

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| {
            MusicSwapError::AudioDeviceError(format!("Failed to create audio sink: {}", e))
        })?;
        sink.pause();

        Ok(RodioTrack {
            sink,
            buffer: buffer.clone(),
            looping: Cell::new(false),
            region: Cell::new(None),
        })
    }

    fn play(&mut self, track: &RodioTrack) -> Result<()> {
        let source = decode(&track.buffer)?;

        let section = track.region.get().and_then(loop_section);
        match (track.looping.get(), section) {
            (true, Some((intro, start, length))) => {
                debug!(?intro, ?start, ?length, "queueing intro and loop section");
                let body = decode(&track.buffer)?
                    .skip_duration(start)
                    .take_duration(length)
                    .buffered()
                    .repeat_infinite();
                track.sink.append(source.take_duration(intro));
                track.sink.append(body);
            }
            (true, _) => track.sink.append(source.buffered().repeat_infinite()),
            (false, _) => track.sink.append(source),
        }

        track.sink.play();
        Ok(())
    }

    fn stop(&mut self, track: &RodioTrack) {
        track.sink.stop();
    }

    fn release(&mut self, track: RodioTrack) {
        drop(track);
    }

    fn set_volume(&mut self, track: &RodioTrack, volume: f32) {
        track.sink.set_volume(volume.max(0.0) / 100.0);
    }

    fn set_loop(&mut self, track: &RodioTrack, enabled: bool) {
        track.looping.set(enabled);
    }

    fn set_loop_bounds(&mut self, track: &RodioTrack, region: LoopRegion) {
        track.region.set(Some(region));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_backend() -> Option<RodioBackend> {
        match RodioBackend::new() {
            Ok(backend) => Some(backend),
            Err(err) => {
                eprintln!(
                    "Skipping backend::rodio test (audio backend unavailable): {}",
                    err
                );
                None
            }
        }
    }

    #[test]
    fn test_seconds_clamps_negative() {
        assert_eq!(seconds(-1.0), Some(Duration::ZERO));
        assert_eq!(seconds(1.5), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_huge_region_falls_back_to_whole_track() {
        assert_eq!(seconds(1e300), None);
        let region = LoopRegion {
            start: 0.0,
            end: 1e300,
        };
        assert_eq!(loop_section(region), None);
    }

    #[test]
    fn test_loop_section() {
        let region = LoopRegion {
            start: 10.5,
            end: 42.0,
        };
        assert_eq!(
            loop_section(region),
            Some((
                Duration::from_secs(42),
                Duration::from_millis(10_500),
                Duration::from_millis(31_500),
            ))
        );
        let empty = LoopRegion {
            start: 3.0,
            end: 3.0,
        };
        assert_eq!(loop_section(empty), None);
    }

    #[test]
    fn test_garbage_buffer_is_rejected() {
        let Some(mut backend) = try_backend() else {
            return;
        };
        let buffer = AudioBuffer::from(vec![0u8; 64]);
        assert!(matches!(
            backend.start(&buffer),
            Err(MusicSwapError::Decode(_))
        ));
    }
}
