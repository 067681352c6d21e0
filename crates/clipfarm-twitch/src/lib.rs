//! Twitch clients for the ClipFarm pipeline.
//!
//! This crate provides:
//! - App access token acquisition and caching (`TokenProvider`)
//! - Creator lookup and clip discovery over the Helix API (`ClipSourceClient`)
//! - Playable media URL resolution over GQL (`GqlPlaybackResolver`)
//! - Bounded retry with exponential backoff for transient failures

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod retry;

pub use auth::TokenProvider;
pub use client::{ClipQuery, ClipSource, ClipSourceClient, Discovery};
pub use config::TwitchConfig;
pub use error::{TwitchError, TwitchResult};
pub use resolver::{GqlPlaybackResolver, PlaybackResolver};
pub use retry::{retry_async, RetryConfig};
