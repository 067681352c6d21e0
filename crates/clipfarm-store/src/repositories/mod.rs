//! Repository traits and their SQLx implementations.

pub mod clip;
pub mod highlight;
pub mod streamer;

pub use clip::{ClipRepository, SqlxClipRepository};
pub use highlight::{HighlightRepository, SqlxHighlightRepository};
pub use streamer::{SqlxStreamerRepository, StreamerRepository};
