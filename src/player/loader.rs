//! Source prefetching.
//!
//! Local files are read fully up front: trading time-to-first-byte for
//! immunity to flaky range-request serving, which matters more for long
//! recitations. Remote sources go through the on-disk byte cache so a
//! repeated listen does not refetch.

use crate::cache;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// An audio source reference from the content library. Anything that is not
/// an `http(s)` URL is treated as a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Local(PathBuf),
    Remote(String),
}

impl AudioSource {
    pub fn classify(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AudioSource::Remote(url.to_string())
        } else {
            AudioSource::Local(PathBuf::from(url))
        }
    }
}

/// Fetch the complete bytes for a source. Blocking; the façade runs this on
/// a worker thread guarded by a load token.
pub fn fetch_source_bytes(source: &AudioSource, use_cache: bool) -> Result<Vec<u8>> {
    match source {
        AudioSource::Local(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Reading local audio {}", path.display()))?;
            debug!(path = %path.display(), len = bytes.len(), "Prefetched local audio");
            Ok(bytes)
        }
        AudioSource::Remote(url) => {
            if use_cache {
                if let Some(bytes) = cache::load_cached(url) {
                    return Ok(bytes);
                }
            }
            let response = reqwest::blocking::get(url)
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Fetching remote audio {url}"))?;
            let bytes = response
                .bytes()
                .with_context(|| format!("Downloading remote audio {url}"))?
                .to_vec();
            info!(%url, len = bytes.len(), "Fetched remote audio");
            if use_cache {
                cache::save_cached(url, &bytes);
            }
            Ok(bytes)
        }
    }
}
