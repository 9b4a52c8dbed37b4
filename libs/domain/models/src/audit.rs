// [libs/domain/models/src/audit.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    AuthSuccess,
    AuthFailure,
    SsoAuthSuccess,
    SessionTerminated,
    ExecuteRequested,
    ExecuteBlocked,
    ExecuteCompleted,
    SubscriptionInactiveBlock,
    QcBlock,
    PromptBypassAttempt,
    ReplayDetected,
    GuardrailTriggered,
}

/// Logical `audit_events` collection entry, indexed by compound
/// `(sessionID, timestamp desc)` and `eventType`. `details` passes
/// through the redaction layer before
/// it is ever persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub event_type: AuditEventType,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub details: HashMap<String, Value>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            session_id: None,
            user_id: None,
            details: HashMap::new(),
            at: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
