//! Per-clip acquisition: resolve a playable URL, then download it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use clipfarm_media::{MediaDownloader, MediaError};
use clipfarm_models::{Clip, ClipFile};
use clipfarm_twitch::{retry_async, PlaybackResolver, RetryConfig, TwitchResult};

/// Result of acquiring one clip. A `Failed` clip is dropped from the batch.
#[derive(Debug)]
pub enum AcquireOutcome {
    Acquired {
        /// Position in the ranked discovery
        rank: usize,
        clip: Clip,
        file: ClipFile,
        bytes: u64,
    },
    Failed {
        rank: usize,
        clip: Clip,
        reason: String,
    },
}

/// Resolves and downloads clips into a run's download directory.
#[derive(Clone)]
pub struct ClipAcquirer {
    resolver: Arc<dyn PlaybackResolver>,
    downloader: Arc<dyn MediaDownloader>,
    retry: RetryConfig,
}

impl ClipAcquirer {
    /// `download_retries` counts retries after the first attempt.
    pub fn new(
        resolver: Arc<dyn PlaybackResolver>,
        downloader: Arc<dyn MediaDownloader>,
        download_retries: u32,
    ) -> Self {
        Self {
            resolver,
            downloader,
            retry: RetryConfig::new("clip_download")
                .with_max_retries(download_retries)
                .with_base_delay(Duration::from_millis(500)),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Acquire `clip` into `dir`. Download errors and per-clip resolution
    /// errors become [`AcquireOutcome::Failed`]; any other resolver error
    /// (rejected credentials) is returned as `Err`.
    pub async fn acquire(
        &self,
        rank: usize,
        clip: Clip,
        dir: &Path,
    ) -> TwitchResult<AcquireOutcome> {
        let url = match self.resolver.resolve_playable_url(&clip).await {
            Ok(url) => url,
            Err(e) if e.is_per_clip() => {
                warn!(external_id = %clip.external_id, error = %e, "Failed to resolve clip");
                return Ok(AcquireOutcome::Failed {
                    rank,
                    clip,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let destination = dir.join(clip.file_name());
        let result = retry_async(
            &self.retry,
            || self.downloader.download(&url, &destination),
            MediaError::is_retryable,
        )
        .await;

        let outcome = match result {
            Ok(bytes) => {
                debug!(external_id = %clip.external_id, bytes, "Downloaded clip");
                let file = ClipFile::new(destination, clip.duration_seconds);
                AcquireOutcome::Acquired {
                    rank,
                    clip,
                    file,
                    bytes,
                }
            }
            Err(e) => {
                warn!(external_id = %clip.external_id, error = %e, "Failed to download clip");
                AcquireOutcome::Failed {
                    rank,
                    clip,
                    reason: e.to_string(),
                }
            }
        };
        Ok(outcome)
    }
}
