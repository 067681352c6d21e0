//! Clip models, discovery filtering and ranking.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short video discovered on the clip platform.
///
/// Clips are immutable once built: view counts are a snapshot taken at
/// discovery time and are never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Platform-unique identifier (also the clip slug on Twitch)
    pub external_id: String,
    pub title: String,
    /// Name of the viewer who created the clip
    pub creator_name: String,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub broadcaster_id: String,
    /// Public page URL of the clip
    pub source_url: String,
    /// Length in seconds (the platform reports fractional values)
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Clip {
    /// File name used for the downloaded media of this clip.
    pub fn file_name(&self) -> String {
        format!(
            "clip_{}_{}_{}.mp4",
            self.language.as_deref().unwrap_or("und"),
            sanitize_component(&self.broadcaster_id),
            sanitize_component(&self.external_id)
        )
    }

    /// Ordering used for compilation rank: most viewed first, then by id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .view_count
            .cmp(&self.view_count)
            .then_with(|| self.external_id.cmp(&other.external_id))
    }
}

/// Keep only characters that are safe in a single path component.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Discovery policy: which clips are worth compiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipFilter {
    /// Clips shorter than this are dropped (inclusive lower bound)
    pub min_duration_seconds: f64,
    /// Clips must have strictly more views than this
    pub min_view_count: u64,
}

impl Default for ClipFilter {
    fn default() -> Self {
        Self {
            min_duration_seconds: 10.0,
            min_view_count: 400,
        }
    }
}

impl ClipFilter {
    pub fn new(min_duration_seconds: f64, min_view_count: u64) -> Self {
        Self {
            min_duration_seconds,
            min_view_count,
        }
    }

    /// Whether a clip passes both the duration and the view thresholds.
    pub fn accepts(&self, clip: &Clip) -> bool {
        clip.duration_seconds >= self.min_duration_seconds && clip.view_count > self.min_view_count
    }
}

/// Sort clips into compilation rank order.
pub fn rank_clips(mut clips: Vec<Clip>) -> Vec<Clip> {
    clips.sort_by(Clip::rank_cmp);
    clips
}

/// Ranked discovery result.
///
/// A finite, consuming sequence: once iterated it cannot be restarted.
#[derive(Debug)]
pub struct RankedClips {
    inner: std::vec::IntoIter<Clip>,
}

impl RankedClips {
    /// Filter and rank a raw discovery batch.
    pub fn from_discovered(clips: Vec<Clip>, filter: &ClipFilter) -> Self {
        let kept = clips.into_iter().filter(|c| filter.accepts(c)).collect();
        Self {
            inner: rank_clips(kept).into_iter(),
        }
    }
}

impl Iterator for RankedClips {
    type Item = Clip;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RankedClips {}
