//! Canonical content model for the reader.
//!
//! The source data (`data/data.json`) grew field aliases over time
//! (`audioTimestamp` next to `startTime`, `numberInSurah` next to `number`).
//! All of that is collapsed here, at the deserialization boundary, so the
//! sync engine only ever sees one shape.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One verse as the engine consumes it. `index` is positional within the
/// bound list and is reassigned on load; declared values are not trusted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    #[serde(default)]
    pub index: usize,
    /// Human-facing 1-based verse number; differs from `index + 1` when a
    /// lecture covers an excerpt of the surah.
    #[serde(default, alias = "number", alias = "numberInSurah")]
    pub display_number: u32,
    #[serde(default, alias = "textArabic")]
    pub text: String,
    /// Declared recitation start offset in seconds.
    #[serde(default, alias = "audioTimestamp")]
    pub start_time: Option<f64>,
    /// Declared end offset; absent means "until the next verse starts".
    #[serde(default, alias = "audioEndTimestamp", alias = "endTime")]
    pub end_time_hint: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surah {
    pub id: u32,
    #[serde(default, alias = "nameArabic")]
    pub name_arabic: String,
    #[serde(default, alias = "nameKurdish")]
    pub name_kurdish: String,
    #[serde(default)]
    pub verse_count: u32,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub audio_duration: Option<f64>,
    #[serde(default)]
    pub verses: Vec<Verse>,
}

impl Surah {
    /// Assign positional indices and fill missing display numbers. Called
    /// once on load; idempotent.
    pub fn normalize(&mut self) {
        for (i, verse) in self.verses.iter_mut().enumerate() {
            verse.index = i;
            if verse.display_number == 0 {
                verse.display_number = (i + 1) as u32;
            }
        }
        if self.verse_count == 0 {
            self.verse_count = self.verses.len() as u32;
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio_url.is_some() && !self.verses.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Library {
    #[serde(default)]
    pub surahs: Vec<Surah>,
}

impl Library {
    pub fn surah(&self, id: u32) -> Option<&Surah> {
        self.surahs.iter().find(|s| s.id == id)
    }

    /// Surahs that can actually drive the player.
    pub fn surahs_with_audio(&self) -> Vec<&Surah> {
        self.surahs.iter().filter(|s| s.has_audio()).collect()
    }
}

/// Load and normalize the content library from a JSON file.
pub fn load_library(path: &Path) -> Result<Library> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Reading content library {}", path.display()))?;
    let mut library: Library =
        serde_json::from_str(&data).context("Parsing content library JSON")?;
    for surah in &mut library.surahs {
        surah.normalize();
        debug!(
            surah = surah.id,
            verses = surah.verses.len(),
            audio = surah.audio_url.is_some(),
            "Loaded surah"
        );
    }
    info!(surahs = library.surahs.len(), "Content library loaded");
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::{Library, Surah, Verse};

    #[test]
    fn accepts_legacy_field_names() {
        let verse: Verse = serde_json::from_str(
            r#"{"numberInSurah": 3, "audioTimestamp": 12.5, "endTime": 20.0, "textArabic": "text"}"#,
        )
        .expect("parse");
        assert_eq!(verse.display_number, 3);
        assert_eq!(verse.start_time, Some(12.5));
        assert_eq!(verse.end_time_hint, Some(20.0));
        assert_eq!(verse.text, "text");
    }

    #[test]
    fn normalize_assigns_indices_and_numbers() {
        let mut surah: Surah = serde_json::from_str(
            r#"{"id": 2, "verses": [{"index": 9}, {"number": 7}]}"#,
        )
        .expect("parse");
        surah.normalize();
        assert_eq!(surah.verses[0].index, 0);
        assert_eq!(surah.verses[0].display_number, 1);
        assert_eq!(surah.verses[1].index, 1);
        assert_eq!(surah.verses[1].display_number, 7);
        assert_eq!(surah.verse_count, 2);
    }

    #[test]
    fn filters_surahs_without_audio() {
        let library: Library = serde_json::from_str(
            r#"{"surahs": [
                {"id": 1, "audioUrl": "a.mp3", "verses": [{"number": 1}]},
                {"id": 2, "verses": [{"number": 1}]}
            ]}"#,
        )
        .expect("parse");
        let with_audio = library.surahs_with_audio();
        assert_eq!(with_audio.len(), 1);
        assert_eq!(with_audio[0].id, 1);
        assert!(library.surah(2).is_some());
        assert!(library.surah(3).is_none());
    }
}
