//! Music Directory Loader
//!
//! Walks the music directory recursively and caches every regular file under
//! its base name without extension, e.g. `music/dungeons/1c-loop-2.5-61.ogg`
//! is cached as `1c-loop-2.5-61`.

use super::TrackCache;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Create the music directory if it does not exist yet
pub fn ensure_music_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(dir = %path.display(), "Creating music directory");
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Loads tracks from a directory tree into a [`TrackCache`]
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryLoader { root: root.into() }
    }

    /// Directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key for a file: base name without extension
    pub fn track_name(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }

    /// All regular files below the root, in a stable (sorted) order
    pub fn scan(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable music entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    /// Read every file into the cache; returns the number of tracks cached
    ///
    /// Files that cannot be read or named are logged and skipped.
    pub fn load_into(&self, cache: &TrackCache) -> Result<usize> {
        if !self.root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("music directory '{}' not found", self.root.display()),
            )
            .into());
        }

        let mut loaded = 0;
        for path in self.scan() {
            let Some(name) = Self::track_name(&path) else {
                warn!(file = %path.display(), "Skipping file without a usable name");
                continue;
            };
            match fs::read(&path) {
                Ok(data) => {
                    info!("Caching music track from folder: {}.", path.display());
                    cache.put(&name, data);
                    loaded += 1;
                }
                Err(e) => warn!(file = %path.display(), "Failed to read music file: {}", e),
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_name_strips_extension() {
        assert_eq!(
            DirectoryLoader::track_name(Path::new("music/area/2a-loop.ogg")).as_deref(),
            Some("2a-loop")
        );
        assert_eq!(
            DirectoryLoader::track_name(Path::new("7")).as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_load_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("dungeons");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("2a.ogg"), [1u8, 2]).unwrap();
        fs::write(nested.join("1c-loop-2.5-61.wav"), [3u8]).unwrap();

        let cache = TrackCache::new();
        let loaded = DirectoryLoader::new(dir.path()).load_into(&cache).unwrap();
        assert_eq!(loaded, 2);

        let track = cache.find(0x1c).unwrap();
        assert_eq!(track.name(), "1c-loop-2.5-61");
        assert_eq!(track.buffer().as_ref(), &[3u8]);
        assert!(cache.find(0x2a).is_some());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TrackCache::new();
        let result = DirectoryLoader::new(dir.path().join("absent")).load_into(&cache);
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ensure_music_dir_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        ensure_music_dir(&music).unwrap();
        assert!(music.is_dir());
        ensure_music_dir(&music).unwrap();
    }
}
