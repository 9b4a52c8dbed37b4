// [apps/gateway/src/services/push.rs]
//! Outbound-only push channel: `Broadcast
//! (sessionID, message)`. Delivery is best-effort for connected
//! sessions — state backing the pipeline is independently persisted
//! (`myndlens_infra_store`), so a dropped push never loses progress,
//! only its live notification.
//!
//! Each session owns its own outbound queue: pushes are addressed to
//! one `sessionID`, never rebroadcast to the whole fleet.

use dashmap::DashMap;
use myndlens_domain_models::Envelope;
use tokio::sync::mpsc;

const PUSH_QUEUE_CAPACITY: usize = 64;

#[derive(Default)]
pub struct PushRegistry {
    channels: DashMap<String, mpsc::Sender<Envelope>>,
}

impl PushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the outbound channel for a freshly authenticated
    /// session, returning the receiving half for the connection's
    /// sender task to drain.
    pub fn register(&self, session_id: &str) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(PUSH_QUEUE_CAPACITY);
        self.channels.insert(session_id.to_string(), tx);
        rx
    }

    pub fn unregister(&self, session_id: &str) {
        self.channels.remove(session_id);
    }

    /// Best-effort send: a full queue or a session with no connected
    /// socket simply drops the push.
    pub fn push(&self, session_id: &str, envelope: Envelope) {
        if let Some(tx) = self.channels.get(session_id) {
            let _ = tx.try_send(envelope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myndlens_domain_models::MessageType;
    use serde_json::json;

    #[tokio::test]
    async fn registered_session_receives_push() {
        let registry = PushRegistry::new();
        let mut rx = registry.register("s1");
        registry.push("s1", Envelope::new(MessageType::HeartbeatAck, json!({"seq": 1})));
        let received = rx.recv().await;
        assert!(received.is_some());
    }

    #[test]
    fn push_to_unknown_session_is_a_silent_no_op() {
        let registry = PushRegistry::new();
        registry.push("ghost", Envelope::new(MessageType::Error, json!({})));
    }
}
