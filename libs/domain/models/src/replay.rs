// [libs/domain/models/src/replay.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// TTL-indexed, unique-on-hash record guarding against MIO and touch
/// token replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub token_hash: String,
    pub used_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReplayRecord {
    pub fn new(token_hash: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            token_hash,
            used_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
