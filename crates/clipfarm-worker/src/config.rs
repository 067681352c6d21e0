//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use clipfarm_media::CompileOptions;
use clipfarm_models::ClipFilter;
use clipfarm_twitch::ClipQuery;

use crate::error::{WorkerError, WorkerResult};

const DEFAULT_LOOKBACK_DAYS: i64 = 5;

/// Longest accepted discovery window.
pub const MAX_LOOKBACK_DAYS: i64 = 365;

/// Twitch logins are 1 to 25 ASCII letters, digits or underscores.
const MAX_LOGIN_LEN: usize = 25;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of the per-run download and output directories
    pub work_dir: PathBuf,
    pub database_url: String,
    /// How many days back clips are discovered
    pub lookback_days: i64,
    /// Clips shorter than this are skipped (inclusive bound)
    pub min_duration_secs: f64,
    /// Clips need strictly more views than this
    pub min_views: u64,
    /// Requested fade in/out length per clip
    pub fade_secs: f64,
    /// Maximum concurrent clip downloads
    pub max_downloads: usize,
    /// Maximum concurrent FFmpeg transforms
    pub max_transforms: usize,
    /// Retries per clip download after the first attempt
    pub download_retries: u32,
    pub download_timeout: Duration,
    /// Per FFmpeg invocation
    pub transcode_timeout: Duration,
    pub ffmpeg_path: PathBuf,
    /// Where DirectoryPublisher places finished compilations
    pub publish_dir: PathBuf,
    /// Channel manager contact for the description; line omitted when unset
    pub contact: Option<String>,
    /// Creator used when the binary gets no argument
    pub creator: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("build"),
            database_url: "sqlite://clipfarm.db".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_duration_secs: 10.0,
            min_views: 400,
            fade_secs: 0.5,
            max_downloads: 4,
            max_transforms: 4,
            download_retries: 2,
            download_timeout: Duration::from_secs(300),
            transcode_timeout: Duration::from_secs(900),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            publish_dir: PathBuf::from("published"),
            contact: None,
            creator: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("CLIPFARM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            lookback_days: parse_lookback_days(std::env::var("CLIPFARM_LOOKBACK_DAYS").ok()),
            min_duration_secs: std::env::var("CLIPFARM_MIN_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_duration_secs),
            min_views: std::env::var("CLIPFARM_MIN_VIEWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_views),
            fade_secs: std::env::var("CLIPFARM_FADE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fade_secs),
            max_downloads: std::env::var("CLIPFARM_MAX_DOWNLOADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_downloads)
                .max(1),
            max_transforms: std::env::var("CLIPFARM_MAX_TRANSFORMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_transforms)
                .max(1),
            download_retries: std::env::var("CLIPFARM_DOWNLOAD_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.download_retries),
            download_timeout: Duration::from_secs(
                std::env::var("CLIPFARM_DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            transcode_timeout: Duration::from_secs(
                std::env::var("CLIPFARM_TRANSCODE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            publish_dir: std::env::var("PUBLISH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.publish_dir),
            contact: non_empty_var("CLIPFARM_CONTACT"),
            creator: non_empty_var("CLIPFARM_CREATOR"),
        }
    }

    /// Discovery window and filter for the clip source. A lookback outside
    /// `1..=MAX_LOOKBACK_DAYS` uses the default window.
    pub fn clip_query(&self) -> ClipQuery {
        let days = if lookback_in_range(self.lookback_days) {
            self.lookback_days
        } else {
            DEFAULT_LOOKBACK_DAYS
        };
        ClipQuery {
            lookback: chrono::Duration::days(days),
            filter: ClipFilter::new(self.min_duration_secs, self.min_views),
        }
    }

    /// `<work_dir>/downloads/<creator>`
    pub fn downloads_dir(&self, creator: &str) -> PathBuf {
        self.work_dir.join("downloads").join(creator)
    }

    /// `<work_dir>/output/<creator>`
    pub fn output_dir(&self, creator: &str) -> PathBuf {
        self.work_dir.join("output").join(creator)
    }

    /// Final compilation path for a creator.
    pub fn output_path(&self, creator: &str) -> PathBuf {
        self.output_dir(creator)
            .join(format!("{creator}_merged_video.mp4"))
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            fade_seconds: self.fade_secs,
            max_parallel: self.max_transforms.max(1),
            ..CompileOptions::default()
        }
    }
}

/// Reject creator logins that could escape the per-run directories.
pub fn validate_login(login: &str) -> WorkerResult<()> {
    let valid = !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(WorkerError::config(format!("invalid creator login {login:?}")))
    }
}

fn lookback_in_range(days: i64) -> bool {
    (1..=MAX_LOOKBACK_DAYS).contains(&days)
}

fn parse_lookback_days(raw: Option<String>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_LOOKBACK_DAYS;
    };
    match raw.trim().parse::<i64>() {
        Ok(days) if lookback_in_range(days) => days,
        _ => {
            warn!(
                value = %raw,
                default = DEFAULT_LOOKBACK_DAYS,
                "CLIPFARM_LOOKBACK_DAYS must be between 1 and {}, using default",
                MAX_LOOKBACK_DAYS
            );
            DEFAULT_LOOKBACK_DAYS
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
