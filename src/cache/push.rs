//! Pushed Tracks
//!
//! Other components can hand over tracks at runtime (e.g. a mod shipping its
//! own music). A [`TrackPusher`] can be cloned into any thread; pushes land in
//! the shared cache and become visible to the next frame's snapshot.

use super::{AudioBuffer, TrackCache};
use std::sync::Arc;
use tracing::info;

/// Track supplied by an external event source
#[derive(Debug, Clone)]
pub struct PushedTrack {
    /// Cache key, same grammar as file base names
    pub name: String,
    /// Audio asset
    pub content: Vec<u8>,
}

/// Entry point for pushed tracks
#[derive(Debug, Clone)]
pub struct TrackPusher {
    cache: Arc<TrackCache>,
}

impl TrackPusher {
    /// Create a pusher feeding the given cache
    pub fn new(cache: Arc<TrackCache>) -> Self {
        TrackPusher { cache }
    }

    /// Cache a pushed track (last write wins on duplicate names)
    pub fn push(&self, track: PushedTrack) {
        info!("Caching music track from API: {}.", track.name);
        self.cache
            .put(&track.name, AudioBuffer::from(track.content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_overwrites_directory_track() {
        let cache = Arc::new(TrackCache::new());
        cache.put("2a", vec![1u8]);

        let pusher = TrackPusher::new(Arc::clone(&cache));
        pusher.push(PushedTrack {
            name: "2a".into(),
            content: vec![7u8, 7],
        });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.find(0x2a).unwrap().buffer().as_ref(), &[7u8, 7]);
    }

    #[test]
    fn test_push_from_other_thread() {
        let cache = Arc::new(TrackCache::new());
        let pusher = TrackPusher::new(Arc::clone(&cache));

        let workers: Vec<_> = (0..4u32)
            .map(|i| {
                let pusher = pusher.clone();
                thread::spawn(move || {
                    pusher.push(PushedTrack {
                        name: format!("{:x}", i),
                        content: vec![i as u8],
                    })
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(cache.len(), 4);
        for i in 0..4 {
            assert!(cache.find(i).is_some());
        }
    }
}
