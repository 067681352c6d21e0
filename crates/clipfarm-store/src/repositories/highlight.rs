//! Highlight repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use clipfarm_models::Highlight;

use crate::error::StoreResult;

#[derive(Debug, Clone, FromRow)]
struct HighlightRow {
    id: i64,
    streamer_id: i64,
    sequence: i64,
    title: String,
    created_at: DateTime<Utc>,
}

impl From<HighlightRow> for Highlight {
    fn from(row: HighlightRow) -> Self {
        Highlight {
            id: row.id,
            streamer_id: row.streamer_id,
            sequence: row.sequence,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

/// Highlight repository trait.
#[async_trait]
pub trait HighlightRepository: Send + Sync {
    /// Sequence number the next compilation of this streamer will get.
    async fn next_sequence(&self, streamer_id: i64) -> StoreResult<i64>;
    /// Record a published compilation under the next free sequence number.
    async fn record(&self, streamer_id: i64, title: &str) -> StoreResult<Highlight>;
    async fn latest(&self, streamer_id: i64) -> StoreResult<Option<Highlight>>;
}

/// SQLx implementation of HighlightRepository.
pub struct SqlxHighlightRepository {
    pool: SqlitePool,
}

impl SqlxHighlightRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HighlightRepository for SqlxHighlightRepository {
    async fn next_sequence(&self, streamer_id: i64) -> StoreResult<i64> {
        let (next,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(sequence), 0) + 1 FROM highlights WHERE streamer_id = ?",
        )
        .bind(streamer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(next)
    }

    async fn record(&self, streamer_id: i64, title: &str) -> StoreResult<Highlight> {
        let row = sqlx::query_as::<_, HighlightRow>(
            r#"
            INSERT INTO highlights (streamer_id, sequence, title, created_at)
            VALUES (
                ?1,
                (SELECT COALESCE(MAX(sequence), 0) + 1 FROM highlights WHERE streamer_id = ?1),
                ?2,
                ?3
            )
            RETURNING id, streamer_id, sequence, title, created_at
            "#,
        )
        .bind(streamer_id)
        .bind(title)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn latest(&self, streamer_id: i64) -> StoreResult<Option<Highlight>> {
        let row = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, streamer_id, sequence, title, created_at
            FROM highlights WHERE streamer_id = ?
            ORDER BY sequence DESC LIMIT 1
            "#,
        )
        .bind(streamer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Highlight::from))
    }
}
