// [libs/domain/models/src/ws.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client -> server and server -> client message types, protocol
/// version `v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    // client -> server
    Auth,
    Heartbeat,
    AudioChunk,
    TextInput,
    ExecuteRequest,
    Cancel,
    // server -> client
    AuthOk,
    AuthFail,
    HeartbeatAck,
    TranscriptPartial,
    TranscriptFinal,
    DraftUpdate,
    TtsAudio,
    PipelineStage,
    ExecuteBlocked,
    ExecuteOk,
    Error,
    SessionTerminated,
}

/// Duplex message envelope: `{type, id, timestamp, payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl Envelope {
    pub fn new(message_type: MessageType, payload: impl Serialize) -> Self {
        Self {
            message_type,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub device_id: String,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthOkPayload {
    pub session_id: String,
    pub user_id: String,
    pub heartbeat_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthFailPayload {
    pub reason: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatPayload {
    pub session_id: String,
    pub seq: u64,
    pub client_ts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatAckPayload {
    pub seq: u64,
    pub server_ts: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextInputPayload {
    pub session_id: String,
    pub text: String,
}

/// Raw speech carried over the wire. Speech-to-text itself is an
/// external collaborator — the gateway only
/// ferries the chunk to whatever transcription path is configured
/// (mock or real) and never interprets the bytes itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioChunkPayload {
    pub session_id: String,
    pub audio_base64: String,
    pub seq: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelPayload {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptPayload {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftUpdatePayload {
    pub draft_id: String,
    pub action_class: String,
    pub confidence: f32,
    pub summary: String,
    pub unfilled_dimensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionTerminatedPayload {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequestPayload {
    pub session_id: String,
    pub draft_id: String,
    pub touch_token: Option<String>,
    pub biometric_proof: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecuteBlockedCode {
    PresenceStale,
    SubscriptionInactive,
    EnvGuard,
    GuardrailViolation,
    DraftNotFound,
    PipelineNotReady,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteBlockedPayload {
    pub reason: String,
    pub code: ExecuteBlockedCode,
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteOkPayload {
    pub draft_id: String,
    pub mio_id: String,
    pub dispatch_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStageStatus {
    Active,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStagePayload {
    pub stage_id: String,
    pub stage_index: u8,
    pub total_stages: u8,
    pub status: PipelineStageStatus,
    pub stage_name: String,
    pub sub_status: Option<String>,
    pub progress: u8,
    pub execution_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    pub code: String,
}
