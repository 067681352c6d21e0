//! Deduplication gate in front of clip acquisition.

use std::sync::Arc;

use tracing::debug;

use clipfarm_models::Clip;

use crate::error::StoreResult;
use crate::repositories::ClipRepository;

/// Decides whether a clip still needs processing and remembers the ones that
/// were acquired.
///
/// A clip is recorded only after its media was downloaded, so a crash in
/// between re-downloads it on the next run (at-least-once).
#[derive(Clone)]
pub struct DedupGate {
    clips: Arc<dyn ClipRepository>,
}

impl DedupGate {
    pub fn new(clips: Arc<dyn ClipRepository>) -> Self {
        Self { clips }
    }

    /// Whether the clip has never been recorded.
    pub async fn is_new(&self, external_id: &str) -> StoreResult<bool> {
        let known = self.clips.exists(external_id).await?;
        if known {
            debug!(external_id, "Clip already processed");
        }
        Ok(!known)
    }

    /// Record an acquired clip. Idempotent; returns whether a row was written.
    pub async fn record(&self, streamer_id: i64, clip: &Clip) -> StoreResult<bool> {
        self.clips.insert_if_absent(streamer_id, clip).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::repositories::{SqlxClipRepository, SqlxStreamerRepository, StreamerRepository};
    use chrono::Utc;

    fn clip(id: &str) -> Clip {
        Clip {
            external_id: id.to_string(),
            title: "title".to_string(),
            creator_name: "viewer".to_string(),
            view_count: 900,
            created_at: Utc::now(),
            broadcaster_id: "1234".to_string(),
            source_url: format!("https://clips.twitch.tv/{id}"),
            duration_seconds: 15.0,
            language: None,
        }
    }

    #[tokio::test]
    async fn test_recording_twice_stores_one_row() {
        let pool = db::connect_in_memory().await.unwrap();
        db::migrate(&pool).await.unwrap();
        let streamer = SqlxStreamerRepository::new(pool.clone())
            .upsert("acme", "1234")
            .await
            .unwrap();
        let repo = Arc::new(SqlxClipRepository::new(pool));
        let gate = DedupGate::new(repo.clone());

        let b = clip("b");
        assert!(gate.is_new("b").await.unwrap());

        assert!(gate.record(streamer.id, &b).await.unwrap());
        assert!(!gate.record(streamer.id, &b).await.unwrap());

        assert!(!gate.is_new("b").await.unwrap());
        assert!(gate.is_new("c").await.unwrap());
        assert_eq!(repo.count_for_streamer(streamer.id).await.unwrap(), 1);
    }
}
