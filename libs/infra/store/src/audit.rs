// [libs/infra/store/src/audit.rs]
use dashmap::DashMap;
use myndlens_domain_models::AuditEvent;
use std::sync::Mutex;

/// `audit_events`, indexed by compound `(sessionID, timestamp desc)`
/// and `eventType`. Append-only; kept per-session so the
/// compound index is a direct lookup rather than a scan.
#[derive(Default)]
pub struct AuditStore {
    by_session: DashMap<String, Mutex<Vec<AuditEvent>>>,
    unscoped: Mutex<Vec<AuditEvent>>,
}

impl AuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: AuditEvent) {
        match &event.session_id {
            Some(session_id) => {
                self.by_session
                    .entry(session_id.clone())
                    .or_default()
                    .lock()
                    .expect("audit log poisoned")
                    .push(event);
            }
            None => {
                self.unscoped.lock().expect("audit log poisoned").push(event);
            }
        }
    }

    /// Most recent first, matching the `(sessionID, timestamp desc)` index.
    pub fn for_session(&self, session_id: &str) -> Vec<AuditEvent> {
        let mut events = self
            .by_session
            .get(session_id)
            .map(|e| e.lock().expect("audit log poisoned").clone())
            .unwrap_or_default();
        events.sort_by(|a, b| b.at.cmp(&a.at));
        events
    }
}
