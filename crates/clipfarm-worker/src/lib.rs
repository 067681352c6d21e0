//! Clip compilation worker.
//!
//! This crate provides:
//! - The pipeline orchestrator (discover, acquire, compile, hand off, clean up)
//! - Per-clip acquisition with bounded retries
//! - Highlight titles, descriptions and the publisher seam
//! - Run logging and metrics

pub mod acquire;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod presentation;
pub mod publish;
pub mod setup;

#[cfg(test)]
mod testing;

pub use acquire::{AcquireOutcome, ClipAcquirer};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::RunLogger;
pub use pipeline::{PipelineDeps, PipelineOrchestrator, RunReport};
pub use publish::{DirectoryPublisher, PublishReceipt, PublishRequest, Publisher};
pub use setup::build_pipeline;
