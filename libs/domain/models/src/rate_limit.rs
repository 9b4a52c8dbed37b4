// [libs/domain/models/src/rate_limit.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event in a sliding rate-limit window. `bucket` is `type:key`,
/// e.g. `execute_requests:user-42`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub bucket: String,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RateLimitWindow {
    pub fn new(bucket: String, window_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            bucket,
            timestamp: now,
            // Kept longer than the window itself so sweeping doesn't
            // race the count query (mirrors the 2x TTL pattern used
            // for replay records).
            expires_at: now + chrono::Duration::seconds(window_seconds * 2),
        }
    }
}
