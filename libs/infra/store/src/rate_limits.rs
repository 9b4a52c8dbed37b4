// [libs/infra/store/src/rate_limits.rs]
use chrono::Utc;
use dashmap::DashMap;
use myndlens_domain_models::RateLimitWindow;

/// Named limit: `max` events per `window_seconds`. Unknown bucket
/// types are permitted (not present here means unlimited).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    pub max: usize,
    pub window_seconds: i64,
}

pub fn default_rule(limit_type: &str) -> Option<RateLimitRule> {
    match limit_type {
        "ws_messages" => Some(RateLimitRule { max: 120, window_seconds: 60 }),
        "execute_requests" => Some(RateLimitRule { max: 30, window_seconds: 3600 }),
        "audio_chunks" => Some(RateLimitRule { max: 10, window_seconds: 1 }),
        "api_calls" => Some(RateLimitRule { max: 300, window_seconds: 60 }),
        "auth_attempts" => Some(RateLimitRule { max: 10, window_seconds: 300 }),
        _ => None,
    }
}

/// Sliding-window event log, one `Vec` per bucket (`type:key`).
/// `check_and_record` inserts an event, then counts events still
/// inside the window.
#[derive(Default)]
pub struct RateLimitStore {
    events: DashMap<String, Vec<RateLimitWindow>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the event is allowed (count after insert is
    /// within `rule.max`). Unknown limit types always return `true`.
    pub fn check_and_record(&self, limit_type: &str, key: &str) -> bool {
        let Some(rule) = default_rule(limit_type) else {
            return true;
        };
        let bucket = format!("{limit_type}:{key}");
        let now = Utc::now();
        let mut entry = self.events.entry(bucket.clone()).or_default();
        entry.retain(|w| w.expires_at > now);
        entry.push(RateLimitWindow::new(bucket, rule.window_seconds));
        let window_start = now - chrono::Duration::seconds(rule.window_seconds);
        let count_in_window = entry.iter().filter(|w| w.timestamp > window_start).count();
        count_in_window <= rule.max
    }

    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.events.retain(|_, events| {
            let before = events.len();
            events.retain(|w| w.expires_at > now);
            removed += before - events.len();
            !events.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bucket_always_allowed() {
        let store = RateLimitStore::new();
        for _ in 0..1000 {
            assert!(store.check_and_record("mystery_bucket", "user-1"));
        }
    }

    #[test]
    fn rejects_once_over_limit() {
        let store = RateLimitStore::new();
        for _ in 0..10 {
            assert!(store.check_and_record("auth_attempts", "user-1"));
        }
        assert!(!store.check_and_record("auth_attempts", "user-1"));
    }
}
