// [libs/infra/store/src/commits.rs]
use chrono::Utc;
use dashmap::DashMap;
use myndlens_domain_models::{Commit, CommitState, CommitTransition, CoreError};

/// `commits`.
#[derive(Default)]
pub struct CommitStore {
    by_id: DashMap<String, Commit>,
    by_idempotency_key: DashMap<String, String>,
}

impl CommitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_idempotency_key(&self, key: &str) -> Option<Commit> {
        let id = self.by_idempotency_key.get(key)?.clone();
        self.by_id.get(&id).map(|e| e.clone())
    }

    pub fn insert(&self, commit: Commit) -> Commit {
        self.by_idempotency_key
            .insert(commit.idempotency_key.clone(), commit.commit_id.clone());
        self.by_id.insert(commit.commit_id.clone(), commit.clone());
        commit
    }

    pub fn get(&self, commit_id: &str) -> Option<Commit> {
        self.by_id.get(commit_id).map(|e| e.clone())
    }

    /// Optimistic-locking transition: fails if the commit has moved
    /// past `expected_from` since the caller last read it, or if the
    /// target is not reachable from the current state.
    pub fn transition(
        &self,
        commit_id: &str,
        expected_from: CommitState,
        to: CommitState,
        reason: &str,
    ) -> Result<Commit, CoreError> {
        let mut entry = self
            .by_id
            .get_mut(commit_id)
            .ok_or_else(|| CoreError::Internal("commit not found".into()))?;

        if entry.state != expected_from {
            return Err(CoreError::Internal(format!(
                "optimistic lock conflict: expected {:?}, found {:?}",
                expected_from, entry.state
            )));
        }
        if !entry.state.can_transition_to(to) {
            return Err(CoreError::Internal(format!(
                "illegal commit transition {:?} -> {:?}",
                entry.state, to
            )));
        }

        let now = Utc::now();
        entry.transitions.push(CommitTransition {
            from: Some(entry.state),
            to,
            at: now,
            reason: reason.to_string(),
        });
        entry.state = to;
        entry.updated_at = now;
        Ok(entry.clone())
    }
}
