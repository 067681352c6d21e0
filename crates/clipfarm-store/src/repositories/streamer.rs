//! Streamer repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use clipfarm_models::Streamer;

use crate::error::StoreResult;

#[derive(Debug, Clone, FromRow)]
struct StreamerRow {
    id: i64,
    display_name: String,
    broadcaster_id: String,
    created_at: DateTime<Utc>,
}

impl From<StreamerRow> for Streamer {
    fn from(row: StreamerRow) -> Self {
        Streamer {
            id: row.id,
            display_name: row.display_name,
            broadcaster_id: row.broadcaster_id,
            created_at: row.created_at,
        }
    }
}

/// Streamer repository trait.
#[async_trait]
pub trait StreamerRepository: Send + Sync {
    /// Insert the streamer or refresh its display name; returns the stored row.
    async fn upsert(&self, display_name: &str, broadcaster_id: &str) -> StoreResult<Streamer>;
    async fn find_by_broadcaster_id(&self, broadcaster_id: &str) -> StoreResult<Option<Streamer>>;
}

/// SQLx implementation of StreamerRepository.
pub struct SqlxStreamerRepository {
    pool: SqlitePool,
}

impl SqlxStreamerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamerRepository for SqlxStreamerRepository {
    async fn upsert(&self, display_name: &str, broadcaster_id: &str) -> StoreResult<Streamer> {
        let row = sqlx::query_as::<_, StreamerRow>(
            r#"
            INSERT INTO streamers (display_name, broadcaster_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (broadcaster_id) DO UPDATE SET display_name = excluded.display_name
            RETURNING id, display_name, broadcaster_id, created_at
            "#,
        )
        .bind(display_name)
        .bind(broadcaster_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_by_broadcaster_id(&self, broadcaster_id: &str) -> StoreResult<Option<Streamer>> {
        let row = sqlx::query_as::<_, StreamerRow>(
            "SELECT id, display_name, broadcaster_id, created_at FROM streamers WHERE broadcaster_id = ?",
        )
        .bind(broadcaster_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Streamer::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_upsert_keeps_id_and_refreshes_name() {
        let pool = db::connect_in_memory().await.unwrap();
        db::migrate(&pool).await.unwrap();
        let repo = SqlxStreamerRepository::new(pool);

        let first = repo.upsert("acme", "1234").await.unwrap();
        let second = repo.upsert("Acme", "1234").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name, "Acme");
        assert_eq!(first.created_at, second.created_at);

        let found = repo.find_by_broadcaster_id("1234").await.unwrap().unwrap();
        assert_eq!(found, second);
        assert!(repo.find_by_broadcaster_id("9999").await.unwrap().is_none());
    }
}
