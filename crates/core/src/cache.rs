use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

/// Root directory for everything the digester caches.
pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("konspekt")
}

/// Per-video cache directory, keyed by a stable hash of the URL so repeated
/// runs against the same video land in the same place.
pub fn get_cache_dir(url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    get_root_cache_dir().join(hasher.finish().to_string())
}

pub fn get_frames_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("frames")
}

pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}
