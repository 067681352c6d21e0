//! Handoff of finished compilations.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use clipfarm_media::move_file;

use crate::error::{WorkerError, WorkerResult};

/// A compilation ready to be handed off.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub output_path: PathBuf,
    pub creator: String,
    /// Highlight sequence this compilation will be recorded under
    pub sequence: i64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Where a published compilation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub location: String,
}

/// Destination for finished compilations.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> WorkerResult<PublishReceipt>;
}

#[derive(Serialize)]
struct Sidecar<'a> {
    #[serde(flatten)]
    request: &'a PublishRequest,
    published_at: DateTime<Utc>,
}

/// Moves compilations into a local directory next to a JSON metadata file.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    dir: PathBuf,
}

impl DirectoryPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn target(&self, request: &PublishRequest) -> PathBuf {
        self.dir
            .join(format!("{}_highlights_{}.mp4", request.creator, request.sequence))
    }
}

#[async_trait]
impl Publisher for DirectoryPublisher {
    async fn publish(&self, request: &PublishRequest) -> WorkerResult<PublishReceipt> {
        if !request.output_path.is_file() {
            return Err(WorkerError::publish(format!(
                "compilation missing at {}",
                request.output_path.display()
            )));
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.target(request);
        move_file(&request.output_path, &target).await?;

        let sidecar = Sidecar {
            request,
            published_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| WorkerError::publish(format!("failed to encode metadata: {e}")))?;
        tokio::fs::write(target.with_extension("json"), json).await?;

        info!(
            creator = %request.creator,
            sequence = request.sequence,
            path = %target.display(),
            "Published compilation"
        );
        Ok(PublishReceipt {
            location: target.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(output_path: PathBuf) -> PublishRequest {
        PublishRequest {
            output_path,
            creator: "acme".to_string(),
            sequence: 2,
            title: "ACME HIGHLIGHTS TWITCH MAY #2".to_string(),
            description: "desc".to_string(),
            tags: vec!["Twitch".to_string()],
        }
    }

    #[tokio::test]
    async fn test_directory_publisher_moves_file_and_writes_metadata() {
        let work = tempfile::tempdir().unwrap();
        let output = work.path().join("acme_merged_video.mp4");
        tokio::fs::write(&output, b"video").await.unwrap();

        let publisher = DirectoryPublisher::new(work.path().join("published"));
        let receipt = publisher.publish(&request(output.clone())).await.unwrap();

        let target = work.path().join("published/acme_highlights_2.mp4");
        assert_eq!(receipt.location, target.display().to_string());
        assert!(!output.exists());
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"video");

        let meta: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(target.with_extension("json")).await.unwrap())
                .unwrap();
        assert_eq!(meta["title"], "ACME HIGHLIGHTS TWITCH MAY #2");
        assert_eq!(meta["sequence"], 2);
        assert!(meta["published_at"].is_string());
    }

    #[tokio::test]
    async fn test_missing_compilation_is_publish_error() {
        let work = tempfile::tempdir().unwrap();
        let publisher = DirectoryPublisher::new(work.path().join("published"));

        let err = publisher
            .publish(&request(work.path().join("missing.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Publish(_)));
    }
}
