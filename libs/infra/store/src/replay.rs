// [libs/infra/store/src/replay.rs]
use chrono::Utc;
use dashmap::DashMap;
use myndlens_domain_models::ReplayRecord;

/// `replay_cache`, unique on `tokenHash` with TTL on `expiresAt`.
/// Guards MIO and touch-token reuse.
#[derive(Default)]
pub struct ReplayStore {
    by_hash: DashMap<String, ReplayRecord>,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token_hash: &str) -> bool {
        match self.by_hash.get(token_hash) {
            Some(record) => !record.is_expired(Utc::now()),
            None => false,
        }
    }

    /// Records a use, expiring at `2 * ttl_seconds`: the recorded expiry
    /// outlives the verification TTL itself so a retry within the TTL
    /// window still sees the prior use.
    pub fn record(&self, token_hash: String, ttl_seconds: i64) {
        self.by_hash
            .insert(token_hash.clone(), ReplayRecord::new(token_hash, ttl_seconds * 2));
    }

    pub fn retain_unexpired(&self) -> usize {
        let before = self.by_hash.len();
        let now = Utc::now();
        self.by_hash.retain(|_, r| !r.is_expired(now));
        before - self.by_hash.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_detects_replay() {
        let store = ReplayStore::new();
        assert!(!store.contains("hash1"));
        store.record("hash1".to_string(), 120);
        assert!(store.contains("hash1"));
    }
}
