//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Twitch error: {0}")]
    Twitch(#[from] clipfarm_twitch::TwitchError),

    #[error("Store error: {0}")]
    Store(#[from] clipfarm_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] clipfarm_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl WorkerError {
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Twitch(_) => "twitch",
            Self::Store(_) => "store",
            Self::Media(_) => "media",
            Self::Io(_) => "io",
            Self::Publish(_) => "publish",
            Self::Config(_) => "config",
            Self::Cancelled => "cancelled",
        }
    }
}
