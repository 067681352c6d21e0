//! Clip media download over HTTP.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Browser-like user agent; the clip CDN rejects bare HTTP clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches a media URL into a local file.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `url` to `destination`, returning the number of bytes written.
    async fn download(&self, url: &str, destination: &Path) -> MediaResult<u64>;
}

/// Streaming HTTP downloader.
///
/// The body is written to `<destination>.part` and renamed into place only
/// once the stream completes, so a failed download never leaves a file that
/// looks complete.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn stream_to(&self, url: &str, partial: &Path) -> MediaResult<u64> {
        let response = self.client.get(url).send().await.map_err(|e| self.map_http(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "media server returned HTTP {}",
                status.as_u16()
            )));
        }

        let mut file = fs::File::create(partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_http(e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        if written == 0 {
            return Err(MediaError::download_failed("media server returned an empty body"));
        }
        Ok(written)
    }

    fn map_http(&self, e: reqwest::Error) -> MediaError {
        if e.is_timeout() {
            MediaError::Timeout(self.timeout)
        } else {
            MediaError::Http(e)
        }
    }
}

/// Path of the in-progress file for `destination`.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[async_trait]
impl MediaDownloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(destination);
        debug!(destination = %destination.display(), "Downloading clip media");

        match self.stream_to(url, &partial).await {
            Ok(bytes) => {
                fs::rename(&partial, destination).await?;
                info!(destination = %destination.display(), bytes, "Clip media downloaded");
                Ok(bytes)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial.display(), "Failed to remove partial download: {}", cleanup);
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("downloads").join("acme").join("clip_en_1_a.mp4");
        let downloader = HttpDownloader::new(Duration::from_secs(5)).unwrap();

        let bytes = downloader
            .download(&format!("{}/clip.mp4", server.uri()), &destination)
            .await
            .unwrap();

        assert_eq!(bytes, 4096);
        assert_eq!(std::fs::metadata(&destination).unwrap().len(), 4096);
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("clip.mp4");
        let downloader = HttpDownloader::new(Duration::from_secs(5)).unwrap();

        let err = downloader
            .download(&format!("{}/clip.mp4", server.uri()), &destination)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = HttpDownloader::new(Duration::from_millis(200)).unwrap();

        let err = downloader
            .download(&format!("{}/clip.mp4", server.uri()), &dir.path().join("clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout(_)));
        assert!(err.is_retryable());
    }
}
