// [libs/domain/models/src/session.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one authenticated duplex connection.
///
/// Unique per `(user_id, device_id)` active tuple — creating a new
/// session for the same tuple deactivates whatever session held it
/// before. At most one active session per tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub device_id: String,
    pub env: String,
    pub client_version: String,
    pub created_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub heartbeat_seq: u64,
    pub active: bool,
}

impl Session {
    pub fn new(user_id: String, device_id: String, env: String, client_version: String) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            device_id,
            env,
            client_version,
            created_at: now,
            last_heartbeat_at: now,
            heartbeat_seq: 0,
            active: true,
        }
    }

    /// The tuple a session is unique against.
    pub fn identity_tuple(&self) -> (String, String) {
        (self.user_id.clone(), self.device_id.clone())
    }
}

/// A standalone view of the liveness fields, mutated by heartbeat
/// ingress and read by presence checks — kept as its own type so the
/// presence engine can be tested without a full `Session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    pub session_id: String,
    pub last_heartbeat_at: DateTime<Utc>,
    pub heartbeat_seq: u64,
}

impl HeartbeatRecord {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            last_heartbeat_at: session.last_heartbeat_at,
            heartbeat_seq: session.heartbeat_seq,
        }
    }
}
