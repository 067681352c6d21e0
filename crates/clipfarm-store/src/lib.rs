//! SQLite persistence for ClipFarm.
//!
//! This crate provides:
//! - Pool setup and schema creation
//! - Streamer, clip and highlight repositories
//! - The deduplication gate used before clip acquisition

pub mod db;
pub mod dedup;
pub mod error;
pub mod repositories;

pub use dedup::DedupGate;
pub use error::{StoreError, StoreResult};
pub use repositories::{
    ClipRepository, HighlightRepository, SqlxClipRepository, SqlxHighlightRepository,
    SqlxStreamerRepository, StreamerRepository,
};
