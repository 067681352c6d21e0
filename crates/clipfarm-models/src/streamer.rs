//! Streamer (creator) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creator identity as resolved from the clip platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Login name used to look the creator up
    pub login: String,
    pub display_name: String,
    /// Platform broadcaster id
    pub broadcaster_id: String,
}

/// A persisted streamer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streamer {
    /// Internal numeric id
    pub id: i64,
    pub display_name: String,
    pub broadcaster_id: String,
    pub created_at: DateTime<Utc>,
}
