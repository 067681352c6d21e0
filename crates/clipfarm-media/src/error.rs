//! Error types for media operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media acquisition and compilation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    #[error("FFmpeg {stage} failed (exit code {exit_code:?}): {stderr}")]
    TranscodeFailed {
        stage: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MediaError {
    /// Create a transcode failure error.
    pub fn transcode_failed(
        stage: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::TranscodeFailed {
            stage: stage.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether a download that failed this way is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            MediaError::Timeout(_) | MediaError::Io(_) | MediaError::Http(_) => true,
            MediaError::DownloadFailed { .. } => true,
            _ => false,
        }
    }
}
