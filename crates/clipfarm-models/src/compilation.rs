//! Transient compilation working set.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::RunId;

/// A downloaded clip ready for compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipFile {
    pub path: PathBuf,
    pub duration_seconds: f64,
}

impl ClipFile {
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
        }
    }
}

/// Working set for one pipeline run. Never persisted.
#[derive(Debug, Clone)]
pub struct CompilationJob {
    pub run_id: RunId,
    pub creator: String,
    /// Downloaded clips in rank order
    pub clips: Vec<ClipFile>,
    pub output_path: PathBuf,
    pub started_at: Instant,
}

impl CompilationJob {
    pub fn new(run_id: RunId, creator: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            run_id,
            creator: creator.into(),
            clips: Vec::new(),
            output_path: output_path.into(),
            started_at: Instant::now(),
        }
    }

    /// Wall-clock time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Sum of the clip durations in seconds.
    pub fn total_duration_seconds(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_seconds).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
