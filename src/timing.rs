//! Verse Timing Index: normalizes declared per-verse start timestamps into a
//! monotonic lookup table the sync engine can floor-search every frame.
//!
//! Declared data is messy. Timestamps can be missing, zero-by-default,
//! duplicated (several verses recited as one block) or out of order; none of
//! that may crash playback. Everything unusable is dropped at build time so
//! queries stay branch-light.

use crate::format::join_display_numbers;
use crate::progress::progress_percent;
use crate::content::Verse;
use serde::Serialize;
use tracing::debug;

/// Tolerance applied at group boundaries so percent -> time round trips do
/// not fall just short of the start they were derived from.
const BOUNDARY_EPSILON: f64 = 1e-6;

/// One resolved `(verse, start)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEntry {
    pub verse_index: usize,
    pub start_time: f64,
}

/// Verses sharing one recitation start timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseGroup {
    pub start_time: f64,
    /// Sorted member verse indices.
    pub verse_indices: Vec<usize>,
    pub display_numbers: Vec<u32>,
    end_hint: Option<f64>,
}

/// UI-facing derived position for one verse group, used for progress-bar
/// tick rendering and snap seeking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub primary_verse_index: usize,
    pub member_verse_indices: Vec<usize>,
    pub position_percent: f64,
    pub display_numbers: Vec<u32>,
    /// Joined display numbers for the tooltip, e.g. `٤ و ٥`.
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct TimingIndex {
    groups: Vec<VerseGroup>,
}

impl TimingIndex {
    /// Build the index from an ordered verse list.
    ///
    /// A verse contributes only if its start is a finite, non-negative
    /// number. A start of exactly zero is accepted solely for the opening
    /// verse, and only when a later verse carries a positive start;
    /// otherwise zero is default-value noise, not a marker. When no verse
    /// has a positive start the whole list is considered untimed and the
    /// index stays empty.
    pub fn build(verses: &[Verse]) -> Self {
        let has_positive = verses
            .iter()
            .any(|v| v.start_time.is_some_and(|t| t.is_finite() && t > 0.0));
        if !has_positive {
            if !verses.is_empty() {
                debug!(verses = verses.len(), "No usable timing data; index empty");
            }
            return Self::default();
        }

        let mut entries: Vec<(f64, &Verse)> = Vec::with_capacity(verses.len());
        for (position, verse) in verses.iter().enumerate() {
            let Some(start) = verse.start_time else {
                continue;
            };
            if !start.is_finite() || start < 0.0 {
                debug!(verse = verse.index, start, "Dropping malformed start time");
                continue;
            }
            if start == 0.0 && position != 0 {
                debug!(verse = verse.index, "Zero start on non-opening verse treated as missing");
                continue;
            }
            entries.push((start, verse));
        }

        // Declared order is not trusted; sort, then collapse exact
        // duplicates into verse groups.
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.index.cmp(&b.1.index)));

        let mut groups: Vec<VerseGroup> = Vec::with_capacity(entries.len());
        for (start, verse) in entries {
            let end_hint = verse
                .end_time_hint
                .filter(|end| end.is_finite() && *end > start);
            match groups.last_mut() {
                Some(group) if group.start_time == start => {
                    group.verse_indices.push(verse.index);
                    group.display_numbers.push(verse.display_number);
                    group.end_hint = match (group.end_hint, end_hint) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        (a, b) => a.or(b),
                    };
                }
                _ => groups.push(VerseGroup {
                    start_time: start,
                    verse_indices: vec![verse.index],
                    display_numbers: vec![verse.display_number],
                    end_hint,
                }),
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[VerseGroup] {
        &self.groups
    }

    /// Member indices of the group active at `current_time`: the group with
    /// the greatest start not exceeding it (floor search). Empty when the
    /// index is empty, the time is not finite, or the time precedes the
    /// first start.
    pub fn resolve_active(&self, current_time: f64) -> &[usize] {
        if self.groups.is_empty() || !current_time.is_finite() {
            return &[];
        }
        let probe = current_time + BOUNDARY_EPSILON;
        let upper = self.groups.partition_point(|g| g.start_time <= probe);
        if upper == 0 {
            return &[];
        }
        &self.groups[upper - 1].verse_indices
    }

    /// Resolved start for one verse, if it is part of any group.
    pub fn verse_start(&self, verse_index: usize) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.verse_indices.contains(&verse_index))
            .map(|g| g.start_time)
    }

    /// Effective end of a group: its declared end hint when usable, else the
    /// next distinct start, else the end of the audio.
    pub fn group_end(&self, group_idx: usize, audio_duration: f64) -> f64 {
        let Some(group) = self.groups.get(group_idx) else {
            return audio_duration;
        };
        if let Some(end) = group.end_hint {
            return end;
        }
        self.groups
            .get(group_idx + 1)
            .map(|next| next.start_time)
            .unwrap_or(audio_duration)
    }

    /// Progress-bar markers, one per group, sorted by position. Empty when
    /// the duration is degenerate.
    pub fn markers(&self, duration: f64) -> Vec<Marker> {
        if !duration.is_finite() || duration <= 0.0 {
            return Vec::new();
        }
        self.groups
            .iter()
            .map(|group| Marker {
                primary_verse_index: group.verse_indices[0],
                member_verse_indices: group.verse_indices.clone(),
                position_percent: progress_percent(group.start_time, duration),
                display_numbers: group.display_numbers.clone(),
                label: join_display_numbers(&group.display_numbers),
            })
            .collect()
    }
}
