//! Twitch client error types.

use thiserror::Error;

pub type TwitchResult<T> = Result<T, TwitchError>;

#[derive(Debug, Error)]
pub enum TwitchError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Could not resolve playable media for clip {slug}: {reason}")]
    Resolution { slug: String, reason: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TwitchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Http(e)
        }
    }
}

impl TwitchError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn resolution(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TwitchError::Upstream { status, .. } => *status == 429 || *status >= 500,
            TwitchError::Timeout(_) => true,
            TwitchError::Http(e) => e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Whether the failure only concerns a single clip.
    pub fn is_per_clip(&self) -> bool {
        matches!(self, TwitchError::Resolution { .. })
    }
}
