// [libs/infra/store/src/mandates.rs]
use dashmap::DashMap;
use myndlens_domain_models::{CoreError, Mandate, MandateState};

/// Pending mandates keyed by `sessionID`, so a reconnect can resume
/// anything still short of approval (`MandateState::is_resumable`).
#[derive(Default)]
pub struct MandateStore {
    by_session: DashMap<String, Mandate>,
}

impl MandateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, session_id: &str, mandate: Mandate) {
        self.by_session.insert(session_id.to_string(), mandate);
    }

    pub fn get(&self, session_id: &str) -> Option<Mandate> {
        self.by_session.get(session_id).map(|e| e.clone())
    }

    /// Returns the pending mandate only if it is still resumable,
    /// otherwise drops it — a non-resumable mandate should not survive
    /// a reconnect.
    pub fn resume(&self, session_id: &str) -> Option<Mandate> {
        let mandate = self.by_session.get(session_id)?.clone();
        if mandate.state.is_resumable() {
            Some(mandate)
        } else {
            self.by_session.remove(session_id);
            None
        }
    }

    pub fn transition(
        &self,
        session_id: &str,
        to: MandateState,
    ) -> Result<Mandate, CoreError> {
        let mut entry = self
            .by_session
            .get_mut(session_id)
            .ok_or_else(|| CoreError::Internal("mandate not found".into()))?;
        if !entry.state.can_transition_to(to) {
            return Err(CoreError::Internal(format!(
                "illegal mandate transition {:?} -> {:?}",
                entry.state, to
            )));
        }
        entry.state = to;
        Ok(entry.clone())
    }

    pub fn remove(&self, session_id: &str) {
        self.by_session.remove(session_id);
    }
}
