//! Clip repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use clipfarm_models::Clip;

use crate::error::StoreResult;

/// Clip repository trait.
#[async_trait]
pub trait ClipRepository: Send + Sync {
    async fn exists(&self, external_id: &str) -> StoreResult<bool>;
    /// Insert unless a row with the same external id exists.
    /// Returns whether a new row was written.
    async fn insert_if_absent(&self, streamer_id: i64, clip: &Clip) -> StoreResult<bool>;
    async fn count_for_streamer(&self, streamer_id: i64) -> StoreResult<i64>;
}

/// SQLx implementation of ClipRepository.
pub struct SqlxClipRepository {
    pool: SqlitePool,
}

impl SqlxClipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClipRepository for SqlxClipRepository {
    async fn exists(&self, external_id: &str) -> StoreResult<bool> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM clips WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_if_absent(&self, streamer_id: i64, clip: &Clip) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO clips (
                external_id, streamer_id, title, creator_name, view_count,
                duration_seconds, language, source_url, clip_created_at, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(&clip.external_id)
        .bind(streamer_id)
        .bind(&clip.title)
        .bind(&clip.creator_name)
        .bind(i64::try_from(clip.view_count).unwrap_or(i64::MAX))
        .bind(clip.duration_seconds)
        .bind(clip.language.as_deref())
        .bind(&clip.source_url)
        .bind(clip.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn count_for_streamer(&self, streamer_id: i64) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clips WHERE streamer_id = ?")
            .bind(streamer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
