//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for pipeline runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use clipfarm_models::{RunId, RunState};

/// Run logger for structured logging with consistent formatting.
///
/// Every event carries the run id and the creator being compiled.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    creator: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId, creator: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            creator: creator.to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            creator = %self.creator,
            "Run started: {}", message
        );
    }

    /// Log a state transition.
    pub fn log_state(&self, state: RunState) {
        info!(
            run_id = %self.run_id,
            creator = %self.creator,
            state = %state,
            "Run entered {}", state
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            creator = %self.creator,
            "Run progress: {}", message
        );
    }

    /// Log a per-clip problem that does not stop the run.
    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            creator = %self.creator,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            creator = %self.creator,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            creator = %self.creator,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            creator = %self.creator
        )
    }
}
