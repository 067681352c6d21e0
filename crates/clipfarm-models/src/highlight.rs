//! Published highlight compilation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A compilation that was handed off to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: i64,
    pub streamer_id: i64,

    /// 1-based number of this compilation for the streamer
    pub sequence: i64,

    /// Title the compilation was published with
    pub title: String,

    pub created_at: DateTime<Utc>,
}
