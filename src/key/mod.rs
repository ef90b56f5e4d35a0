//! Cache Key Grammar
//!
//! Track names double as playback instructions:
//!
//! ```text
//! <hex-id>[-loop[-<start>-<end>]]
//! ```
//!
//! Segments are split on `-` and whitespace-trimmed. The id is base-16, the
//! loop bounds are decimal seconds. A key whose bounds fail to parse (or are
//! negative, or too large for a playback position) still loops, over the
//! backend's default region.

use crate::backend::LoopRegion;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Literal marking a looping track (second segment)
pub const LOOP_DIRECTIVE: &str = "loop";

/// Key parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// First segment is not a base-16 integer
    #[error("invalid track id '{0}' (expected hexadecimal)")]
    InvalidId(String),

    /// Loop bound segment is not a decimal number
    #[error("invalid loop bound '{0}' (expected decimal seconds)")]
    InvalidLoopBound(String),
}

/// Parsed form of a track cache key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackKey {
    /// Track id the host game uses for this music
    pub id: u32,
    /// Whether playback should loop
    pub looping: bool,
    /// Explicit loop region, if the key carried valid bounds
    pub loop_region: Option<LoopRegion>,
}

impl TrackKey {
    /// Parse a cache key.
    ///
    /// Only an invalid id fails the whole key; bad loop bounds degrade to
    /// looping over the default region.
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        let segments: Vec<&str> = name.split('-').map(str::trim).collect();

        let id = parse_id(segments[0])?;
        let looping = segments.get(1) == Some(&LOOP_DIRECTIVE);

        let mut loop_region = None;
        if looping && segments.len() >= 4 {
            match parse_region(segments[2], segments[3]) {
                Ok(region) => loop_region = Some(region),
                Err(e) => warn!(key = name, "{}; using default loop region", e),
            }
        }

        Ok(TrackKey {
            id,
            looping,
            loop_region,
        })
    }
}

fn parse_id(segment: &str) -> Result<u32, KeyError> {
    u32::from_str_radix(segment, 16).map_err(|_| KeyError::InvalidId(segment.to_string()))
}

fn parse_bound(segment: &str) -> Result<f64, KeyError> {
    segment
        .parse::<f64>()
        .ok()
        .filter(|v| Duration::try_from_secs_f64(*v).is_ok())
        .ok_or_else(|| KeyError::InvalidLoopBound(segment.to_string()))
}

fn parse_region(start: &str, end: &str) -> Result<LoopRegion, KeyError> {
    Ok(LoopRegion {
        start: parse_bound(start)?,
        end: parse_bound(end)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_full_loop_key() {
        let key = TrackKey::parse("2a-loop-10.5-42.0").unwrap();
        assert_eq!(key.id, 0x2a);
        assert!(key.looping);
        let region = key.loop_region.unwrap();
        assert_relative_eq!(region.start, 10.5);
        assert_relative_eq!(region.end, 42.0);
    }

    #[test]
    fn test_parse_plain_id() {
        let key = TrackKey::parse("7").unwrap();
        assert_eq!(key.id, 7);
        assert!(!key.looping);
        assert!(key.loop_region.is_none());
    }

    #[test]
    fn test_parse_invalid_id() {
        assert_eq!(
            TrackKey::parse("zz-loop"),
            Err(KeyError::InvalidId("zz".to_string()))
        );
        assert!(TrackKey::parse("").is_err());
    }

    #[test]
    fn test_segments_are_trimmed() {
        let key = TrackKey::parse(" 1F - loop - 1.25 - 3 ").unwrap();
        assert_eq!(key.id, 0x1f);
        assert!(key.looping);
        assert_eq!(key.loop_region, Some(LoopRegion { start: 1.25, end: 3.0 }));
    }

    #[test]
    fn test_loop_without_bounds() {
        let key = TrackKey::parse("3-loop").unwrap();
        assert!(key.looping);
        assert!(key.loop_region.is_none());

        // Three segments are not enough for a region
        let key = TrackKey::parse("3-loop-5").unwrap();
        assert!(key.looping);
        assert!(key.loop_region.is_none());
    }

    #[test]
    fn test_bad_bounds_degrade_to_default_region() {
        let key = TrackKey::parse("3-loop-abc-12").unwrap();
        assert_eq!(key.id, 3);
        assert!(key.looping);
        assert!(key.loop_region.is_none());
    }

    #[test]
    fn test_loop_directive_is_case_sensitive() {
        let key = TrackKey::parse("3-LOOP-1-2").unwrap();
        assert!(!key.looping);
        assert!(key.loop_region.is_none());
    }

    #[test]
    fn test_non_loop_second_segment_is_ignored() {
        let key = TrackKey::parse("12-title theme").unwrap();
        assert_eq!(key.id, 0x12);
        assert!(!key.looping);
    }

    #[test]
    fn test_bound_parser_reports_segment() {
        assert_eq!(
            parse_bound("x1"),
            Err(KeyError::InvalidLoopBound("x1".to_string()))
        );
        assert!(parse_bound("inf").is_err());
        assert!(parse_bound("-1").is_err());
    }

    #[test]
    fn test_unrepresentable_bound_degrades_to_default_region() {
        let key = TrackKey::parse("1-loop-0-1e300").unwrap();
        assert_eq!(key.id, 1);
        assert!(key.looping);
        assert!(key.loop_region.is_none());
    }
}
