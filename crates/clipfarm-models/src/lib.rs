//! Shared data models for the ClipFarm pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Discovered clips, discovery filters and ranking
//! - Streamers and published highlight compilations
//! - The transient compilation working set
//! - Run identifiers and pipeline states

pub mod clip;
pub mod compilation;
pub mod highlight;
pub mod run;
pub mod streamer;

// Re-export common types
pub use clip::{rank_clips, Clip, ClipFilter, RankedClips};
pub use compilation::{ClipFile, CompilationJob};
pub use highlight::Highlight;
pub use run::{RunId, RunState};
pub use streamer::{Creator, Streamer};
