// [libs/infra/store/src/sessions.rs]
use chrono::Utc;
use dashmap::DashMap;
use myndlens_domain_models::{ConversationState, Session};

/// Heartbeat staleness threshold. Exactly `15.00s` counts as
/// stale; `14.99s` counts as fresh.
pub const HEARTBEAT_TIMEOUT_S: i64 = 15;

/// `sessions` + per-session conversation state, indexed by unique
/// `sessionID`, compound `(userID, deviceID)`, and `lastHeartbeatAt`.
#[derive(Default)]
pub struct SessionStore {
    by_id: DashMap<String, Session>,
    by_identity: DashMap<(String, String), String>,
    conversations: DashMap<String, ConversationState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a newly authenticated session, deactivating any prior
    /// active session for the same `(userID, deviceID)` tuple.
    pub fn create(&self, session: Session) -> Session {
        let identity = session.identity_tuple();
        if let Some(prior_id) = self.by_identity.get(&identity).map(|e| e.clone()) {
            if let Some(mut prior) = self.by_id.get_mut(&prior_id) {
                prior.active = false;
            }
        }
        self.by_identity.insert(identity, session.session_id.clone());
        self.conversations.insert(
            session.session_id.clone(),
            ConversationState::new(session.session_id.clone(), session.user_id.clone()),
        );
        self.by_id.insert(session.session_id.clone(), session.clone());
        session
    }

    /// Same as [`Self::create`], but additionally performs reconnection
    /// migration: if `userID` has an existing
    /// `ConversationState` under a different, still-present session with
    /// at least one fragment, that whole state (fragments, checklist,
    /// questions-asked, phase, `createdAt`) moves to the new session and
    /// the old entry is dropped, rather than starting fresh.
    pub fn create_with_migration(&self, session: Session) -> Session {
        let new_id = session.session_id.clone();
        let old_id = self
            .by_id
            .iter()
            .find(|e| e.user_id == session.user_id && e.session_id != new_id)
            .map(|e| e.session_id.clone());

        let migrated = old_id.as_ref().and_then(|old_id| {
            let has_fragments = self
                .conversations
                .get(old_id)
                .map(|c| !c.fragments.is_empty())
                .unwrap_or(false);
            if !has_fragments {
                return None;
            }
            self.conversations.remove(old_id).map(|(_, mut state)| {
                state.migrate_to(new_id.clone());
                state
            })
        });

        let session = self.create(session);
        if let Some(state) = migrated {
            self.conversations.insert(new_id, state);
        }
        session
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.by_id.get(session_id).map(|e| e.clone())
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.by_id.get(session_id).map(|e| e.active).unwrap_or(false)
    }

    pub fn terminate(&self, session_id: &str) {
        if let Some(mut s) = self.by_id.get_mut(session_id) {
            s.active = false;
        }
    }

    /// Atomically advances `(lastHeartbeatAt, heartbeatSeq)` for an
    /// active session. Returns `None` for unknown or inactive sessions.
    pub fn heartbeat(&self, session_id: &str, seq: u64) -> Option<()> {
        let mut entry = self.by_id.get_mut(session_id)?;
        if !entry.active {
            return None;
        }
        entry.last_heartbeat_at = Utc::now();
        entry.heartbeat_seq = seq;
        Some(())
    }

    /// `CheckPresence(sessionID)`: missing, inactive, or
    /// stale sessions return `false`.
    pub fn check_presence(&self, session_id: &str) -> bool {
        match self.by_id.get(session_id) {
            Some(s) if s.active => {
                (Utc::now() - s.last_heartbeat_at).num_milliseconds() < HEARTBEAT_TIMEOUT_S * 1000
            }
            _ => false,
        }
    }

    pub fn with_conversation<R>(&self, session_id: &str, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R> {
        self.conversations.get_mut(session_id).map(|mut c| f(&mut c))
    }

    pub fn retain_active(&self) -> usize {
        let before = self.by_id.len();
        self.by_id.retain(|_, s| s.active);
        before - self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> Session {
        Session::new("u1".to_string(), "d1".to_string(), "dev".to_string(), "1.0.0".to_string())
    }

    #[test]
    fn presence_stale_at_exact_threshold() {
        let store = SessionStore::new();
        let mut session = new_session();
        session.last_heartbeat_at = Utc::now() - chrono::Duration::seconds(HEARTBEAT_TIMEOUT_S);
        let id = session.session_id.clone();
        store.create(session);
        assert!(!store.check_presence(&id));
    }

    #[test]
    fn creating_session_deactivates_prior() {
        let store = SessionStore::new();
        let first = store.create(new_session());
        let second = store.create(new_session());
        assert!(!store.get(&first.session_id).unwrap().active);
        assert!(store.get(&second.session_id).unwrap().active);
    }
}
