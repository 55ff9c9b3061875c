//! Byte cache for fetched remote audio, keyed under `.cache/` by a hash of
//! the source URL so repeated listens skip the network. Write errors are
//! swallowed after a warning so a read-only disk never breaks playback.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CACHE_DIR: &str = ".cache";

/// Directory for everything cached about one audio source.
pub fn hash_dir(url: &str) -> PathBuf {
    hash_dir_in(Path::new(CACHE_DIR), url)
}

pub fn hash_dir_in(base: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    base.join(hash)
}

fn audio_path_in(base: &Path, url: &str) -> PathBuf {
    hash_dir_in(base, url).join("audio.bin")
}

/// Cached bytes for a source URL, if present.
pub fn load_cached(url: &str) -> Option<Vec<u8>> {
    load_cached_in(Path::new(CACHE_DIR), url)
}

pub fn load_cached_in(base: &Path, url: &str) -> Option<Vec<u8>> {
    let path = audio_path_in(base, url);
    let bytes = fs::read(&path).ok()?;
    debug!(path = %path.display(), len = bytes.len(), "Audio cache hit");
    Some(bytes)
}

/// Persist fetched bytes for a source URL. Best-effort.
pub fn save_cached(url: &str, bytes: &[u8]) {
    save_cached_in(Path::new(CACHE_DIR), url, bytes);
}

pub fn save_cached_in(base: &Path, url: &str, bytes: &[u8]) {
    let path = audio_path_in(base, url);
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), "Failed to create audio cache dir: {err}");
            return;
        }
    }
    if let Err(err) = fs::write(&path, bytes) {
        warn!(path = %path.display(), "Failed to write audio cache: {err}");
    }
}
