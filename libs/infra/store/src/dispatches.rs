// [libs/infra/store/src/dispatches.rs]
use dashmap::DashMap;
use myndlens_domain_models::DispatchRecord;

/// `dispatches` collection, unique on `commits.idempotencyKey`. Keyed
/// by `sessionID:mioID` so the dispatcher's idempotency lookup is a
/// single map read.
#[derive(Default)]
pub struct DispatchStore {
    by_idempotency_key: DashMap<String, DispatchRecord>,
}

impl DispatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, idempotency_key: &str) -> Option<DispatchRecord> {
        self.by_idempotency_key.get(idempotency_key).map(|e| e.clone())
    }

    pub fn insert(&self, record: DispatchRecord) {
        self.by_idempotency_key.insert(record.idempotency_key.clone(), record);
    }
}
