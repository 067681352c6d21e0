//! Run-level metrics.
//!
//! Recorded through the `metrics` facade; the binary installs no exporter,
//! so these are no-ops unless an embedding process installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    pub const RUNS_TOTAL: &str = "clipfarm_runs_total";
    pub const CLIPS_TOTAL: &str = "clipfarm_clips_total";
    pub const RUN_DURATION_SECONDS: &str = "clipfarm_run_duration_seconds";
}

/// Count a finished run by outcome (`published`, `empty`, `failed`, `cancelled`).
pub fn record_run(outcome: &'static str, elapsed: Duration) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}

/// Count clips by outcome (`skipped`, `acquired`, `failed`).
pub fn record_clips(outcome: &'static str, count: usize) {
    if count > 0 {
        counter!(names::CLIPS_TOTAL, "outcome" => outcome).increment(count as u64);
    }
}
