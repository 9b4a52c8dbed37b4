// [libs/domain/models/src/dispatch.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStatus {
    Submitted,
    Rejected,
}

/// `dispatches` collection entry. Keyed by
/// `idempotency_key` (`sessionID:mioID`) so a repeated dispatch attempt
/// returns the prior record verbatim instead of calling the adapter
/// again — at-most-once per `(sessionID, mioID)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub dispatch_id: String,
    pub idempotency_key: String,
    pub mio_id: String,
    pub session_id: String,
    pub tenant_id: String,
    pub action: String,
    pub status: DispatchStatus,
    pub latency_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl DispatchRecord {
    pub fn new(
        idempotency_key: String,
        mio_id: String,
        session_id: String,
        tenant_id: String,
        action: String,
        status: DispatchStatus,
        latency_ms: f64,
    ) -> Self {
        Self {
            dispatch_id: uuid::Uuid::new_v4().to_string(),
            idempotency_key,
            mio_id,
            session_id,
            tenant_id,
            action,
            status,
            latency_ms,
            timestamp: Utc::now(),
        }
    }
}
