// [libs/domain/models/src/commit.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitState {
    Draft,
    PendingConfirmation,
    Confirmed,
    Dispatching,
    Completed,
    Failed,
    Cancelled,
}

impl CommitState {
    /// Explicit allow-map: `* -> CANCELLED` from any non-terminal
    /// state, `FAILED -> DRAFT` for retry, everything else a single
    /// forward edge.
    pub fn allowed_next(self) -> &'static [CommitState] {
        use CommitState::*;
        match self {
            Draft => &[PendingConfirmation, Cancelled],
            PendingConfirmation => &[Confirmed, Cancelled],
            Confirmed => &[Dispatching, Cancelled],
            Dispatching => &[Completed, Failed],
            Completed => &[],
            Cancelled => &[],
            Failed => &[Draft],
        }
    }

    pub fn can_transition_to(self, target: CommitState) -> bool {
        self.allowed_next().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CommitState::Completed | CommitState::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitTransition {
    pub from: Option<CommitState>,
    pub to: CommitState,
    pub at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub commit_id: String,
    pub session_id: String,
    pub draft_id: String,
    pub idempotency_key: String,
    pub state: CommitState,
    pub intent_summary: String,
    pub intent: String,
    pub dimensions: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub transitions: Vec<CommitTransition>,
}

impl Commit {
    pub fn new(
        session_id: String,
        draft_id: String,
        intent_summary: String,
        intent: String,
        dimensions: HashMap<String, Value>,
    ) -> Self {
        let now = Utc::now();
        let idempotency_key = format!("{session_id}:{draft_id}");
        Self {
            commit_id: uuid::Uuid::new_v4().to_string(),
            session_id,
            draft_id,
            idempotency_key,
            state: CommitState::Draft,
            intent_summary,
            intent,
            dimensions,
            created_at: now,
            updated_at: now,
            transitions: vec![CommitTransition {
                from: None,
                to: CommitState::Draft,
                at: now,
                reason: "created".into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_can_only_retry_to_draft() {
        assert_eq!(CommitState::Failed.allowed_next(), &[CommitState::Draft]);
    }

    #[test]
    fn terminal_states_have_no_outgoing_edge() {
        assert!(CommitState::Completed.allowed_next().is_empty());
        assert!(CommitState::Cancelled.allowed_next().is_empty());
    }

    #[test]
    fn dispatching_cannot_cancel() {
        assert!(!CommitState::Dispatching.can_transition_to(CommitState::Cancelled));
    }
}
