//! Track Cache
//!
//! Maps track names to in-memory audio buffers. The cache is filled at
//! startup from the music directory and, at any time afterwards, by pushed
//! tracks. Entries are never removed; inserting an existing name replaces its
//! buffer in place.
//!
//! Readers work on immutable snapshots. A writer copies the entry list,
//! modifies the copy and swaps it in, so an iteration in progress never sees
//! a partially inserted entry.

pub mod loader;
pub mod push;

pub use loader::{ensure_music_dir, DirectoryLoader};
pub use push::{PushedTrack, TrackPusher};

use crate::key::{KeyError, TrackKey};
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;
use tracing::warn;

/// Immutable, cheaply cloneable audio asset
///
/// The engine treats the content as opaque; only the backend decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer(Arc<[u8]>);

impl AudioBuffer {
    /// Size of the asset in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the asset is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for AudioBuffer {
    fn from(data: Vec<u8>) -> Self {
        AudioBuffer(data.into())
    }
}

impl From<&[u8]> for AudioBuffer {
    fn from(data: &[u8]) -> Self {
        AudioBuffer(data.into())
    }
}

impl AsRef<[u8]> for AudioBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for AudioBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// A cache entry with its key parsed once at insertion
#[derive(Debug, Clone)]
pub struct CachedTrack {
    name: Arc<str>,
    buffer: AudioBuffer,
    key: Result<TrackKey, KeyError>,
}

impl CachedTrack {
    fn new(name: &str, buffer: AudioBuffer) -> Self {
        let key = TrackKey::parse(name);
        if let Err(e) = &key {
            warn!(track = name, "{}; track will never be matched", e);
        }
        CachedTrack {
            name: name.into(),
            buffer,
            key,
        }
    }

    /// Cache key (track name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Audio asset
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    /// Parsed key, or the reason the entry is unmatchable
    pub fn key(&self) -> Result<&TrackKey, &KeyError> {
        self.key.as_ref()
    }

    /// Whether this entry replaces the given track id
    pub fn matches(&self, track_id: u32) -> bool {
        matches!(&self.key, Ok(key) if key.id == track_id)
    }
}

/// Point-in-time view of the cache
///
/// Iteration is lazy and can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct TrackSnapshot(Arc<Vec<CachedTrack>>);

impl TrackSnapshot {
    /// Iterate over the entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, CachedTrack> {
        self.0.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry (in insertion order) replacing the given track id
    pub fn find(&self, track_id: u32) -> Option<&CachedTrack> {
        self.iter().find(|track| track.matches(track_id))
    }
}

impl<'a> IntoIterator for &'a TrackSnapshot {
    type Item = &'a CachedTrack;
    type IntoIter = std::slice::Iter<'a, CachedTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Shared track cache
#[derive(Debug, Default)]
pub struct TrackCache {
    entries: RwLock<Arc<Vec<CachedTrack>>>,
}

impl TrackCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a track, replacing any entry with the same name
    ///
    /// A replaced entry keeps its original position, so first-match lookups
    /// stay stable across overwrites.
    pub fn put(&self, name: &str, buffer: impl Into<AudioBuffer>) {
        let track = CachedTrack::new(name, buffer.into());
        let mut entries = self.entries.write();
        let list = Arc::make_mut(&mut *entries);
        match list.iter_mut().find(|t| t.name() == name) {
            Some(existing) => *existing = track,
            None => list.push(track),
        }
    }

    /// Snapshot of all current entries
    pub fn all(&self) -> TrackSnapshot {
        TrackSnapshot(Arc::clone(&*self.entries.read()))
    }

    /// First entry replacing the given track id
    pub fn find(&self, track_id: u32) -> Option<CachedTrack> {
        self.all().find(track_id).cloned()
    }

    /// Number of cached tracks
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
