// [libs/core/authz/src/commit_service.rs]
use myndlens_domain_models::{Commit, CommitState, CoreError};
use myndlens_infra_store::Store;
use serde_json::Value;
use std::collections::HashMap;

/// User-visible mandate lifecycle, independent of MIO.
/// Thin wrapper over [`myndlens_infra_store::CommitStore`] exposing the
/// named transitions instead of raw `(from, to)` pairs, so call sites
/// read as business events rather than state-machine trivia.
pub struct CommitService<'a> {
    store: &'a Store,
}

impl<'a> CommitService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Starts a new commit at `Draft`, or returns the existing one if
    /// this idempotency key was already used — commits, like
    /// dispatches, are at-most-once per key.
    pub fn open(
        &self,
        session_id: String,
        draft_id: String,
        intent_summary: String,
        intent: String,
        dimensions: HashMap<String, Value>,
    ) -> Commit {
        let idempotency_key = format!("{session_id}:{draft_id}");
        if let Some(existing) = self.store.commits.find_by_idempotency_key(&idempotency_key) {
            return existing;
        }
        let commit = Commit::new(session_id, draft_id, intent_summary, intent, dimensions);
        self.store.commits.insert(commit.clone());
        commit
    }

    pub fn request_confirmation(&self, commit_id: &str) -> Result<Commit, CoreError> {
        self.store.commits.transition(commit_id, CommitState::Draft, CommitState::PendingConfirmation, "confirmation requested")
    }

    pub fn confirm(&self, commit_id: &str) -> Result<Commit, CoreError> {
        self.store.commits.transition(commit_id, CommitState::PendingConfirmation, CommitState::Confirmed, "user confirmed")
    }

    pub fn begin_dispatch(&self, commit_id: &str) -> Result<Commit, CoreError> {
        self.store.commits.transition(commit_id, CommitState::Confirmed, CommitState::Dispatching, "dispatch started")
    }

    pub fn complete(&self, commit_id: &str) -> Result<Commit, CoreError> {
        self.store.commits.transition(commit_id, CommitState::Dispatching, CommitState::Completed, "dispatch succeeded")
    }

    pub fn fail(&self, commit_id: &str, reason: &str) -> Result<Commit, CoreError> {
        let current = self.store.commits.get(commit_id).ok_or_else(|| CoreError::Internal("commit not found".into()))?;
        self.store.commits.transition(commit_id, current.state, CommitState::Failed, reason)
    }

    pub fn cancel(&self, commit_id: &str) -> Result<Commit, CoreError> {
        let current = self.store.commits.get(commit_id).ok_or_else(|| CoreError::Internal("commit not found".into()))?;
        self.store.commits.transition(commit_id, current.state, CommitState::Cancelled, "user cancelled")
    }

    /// `FAILED -> DRAFT` retry edge.
    pub fn retry(&self, commit_id: &str) -> Result<Commit, CoreError> {
        self.store.commits.transition(commit_id, CommitState::Failed, CommitState::Draft, "retry requested")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path_transitions_in_order() {
        let store = Store::new();
        let service = CommitService::new(&store);
        let commit = service.open("s1".into(), "d1".into(), "send a message".into(), "COMM_SEND".into(), HashMap::new());

        let commit = service.request_confirmation(&commit.commit_id).unwrap();
        assert_eq!(commit.state, CommitState::PendingConfirmation);
        let commit = service.confirm(&commit.commit_id).unwrap();
        assert_eq!(commit.state, CommitState::Confirmed);
        let commit = service.begin_dispatch(&commit.commit_id).unwrap();
        assert_eq!(commit.state, CommitState::Dispatching);
        let commit = service.complete(&commit.commit_id).unwrap();
        assert_eq!(commit.state, CommitState::Completed);
    }

    #[test]
    fn open_is_idempotent_per_session_and_draft() {
        let store = Store::new();
        let service = CommitService::new(&store);
        let first = service.open("s1".into(), "d1".into(), "x".into(), "COMM_SEND".into(), HashMap::new());
        let second = service.open("s1".into(), "d1".into(), "x".into(), "COMM_SEND".into(), HashMap::new());
        assert_eq!(first.commit_id, second.commit_id);
    }

    #[test]
    fn failed_commit_can_retry_to_draft() {
        let store = Store::new();
        let service = CommitService::new(&store);
        let commit = service.open("s1".into(), "d1".into(), "x".into(), "COMM_SEND".into(), HashMap::new());
        let commit = service.fail(&commit.commit_id, "adapter timeout").unwrap();
        assert_eq!(commit.state, CommitState::Failed);
        let commit = service.retry(&commit.commit_id).unwrap();
        assert_eq!(commit.state, CommitState::Draft);
    }

    #[test]
    fn dispatching_cannot_be_cancelled() {
        let store = Store::new();
        let service = CommitService::new(&store);
        let commit = service.open("s1".into(), "d1".into(), "x".into(), "COMM_SEND".into(), HashMap::new());
        let commit = service.request_confirmation(&commit.commit_id).unwrap();
        let commit = service.confirm(&commit.commit_id).unwrap();
        let commit = service.begin_dispatch(&commit.commit_id).unwrap();
        assert!(service.cancel(&commit.commit_id).is_err());
    }
}
