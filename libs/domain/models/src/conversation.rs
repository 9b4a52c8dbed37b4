// [libs/domain/models/src/conversation.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hard cap on clarifying questions per mandate attempt; a 4th request
/// must be refused.
pub const MAX_QUESTIONS_PER_ATTEMPT: usize = 3;

/// Capture window before an in-progress mandate is force-closed into
/// `PROCESSING`.
pub const CAPTURE_WINDOW_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationPhase {
    Listening,
    Accumulating,
    ActiveCapture,
    Held,
    Resuming,
    Processing,
    ApprovalPending,
    Executing,
    Done,
}

/// One accumulated utterance fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub sub_intents: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecklistSource {
    UserSaid,
    DigitalSelf,
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub dimension: String,
    pub value: Option<String>,
    pub source: Option<ChecklistSource>,
}

/// Set of `{dimension, value, source}` triples, keyed by dimension name
/// so `FillChecklist` is an upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checklist {
    items: HashMap<String, ChecklistItem>,
}

impl Checklist {
    pub fn fill(&mut self, dimension: &str, value: String, source: ChecklistSource) {
        self.items.insert(
            dimension.to_string(),
            ChecklistItem {
                dimension: dimension.to_string(),
                value: Some(value),
                source: Some(source),
            },
        );
    }

    /// Register a dimension as tracked but not yet filled, so it shows
    /// up in `unfilled()` even before any fragment mentions it.
    pub fn track(&mut self, dimension: &str) {
        self.items
            .entry(dimension.to_string())
            .or_insert_with(|| ChecklistItem {
                dimension: dimension.to_string(),
                value: None,
                source: None,
            });
    }

    pub fn unfilled(&self) -> Vec<String> {
        self.items
            .values()
            .filter(|item| item.value.is_none())
            .map(|item| item.dimension.clone())
            .collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.values()
    }
}

/// Per-session singleton bound to one mandate attempt. `reset()` clears
/// everything except session identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub fragments: Vec<Fragment>,
    pub checklist: Checklist,
    pub questions_asked: Vec<String>,
    pub phase: ConversationPhase,
}

impl ConversationState {
    pub fn new(session_id: String, user_id: String) -> Self {
        Self {
            session_id,
            user_id,
            created_at: Utc::now(),
            fragments: Vec::new(),
            checklist: Checklist::default(),
            questions_asked: Vec::new(),
            phase: ConversationPhase::Listening,
        }
    }

    /// Combined transcript is a pure function of `fragments`, never
    /// stored, always derived.
    pub fn combined_transcript(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn add_fragment(&mut self, text: String, sub_intents: Vec<String>, confidence: f32) {
        if self.fragments.is_empty() && self.phase == ConversationPhase::Listening {
            self.phase = ConversationPhase::Accumulating;
        }
        self.fragments.push(Fragment {
            text,
            timestamp: Utc::now(),
            sub_intents,
            confidence,
        });
    }

    pub fn can_ask_question(&self) -> bool {
        self.questions_asked.len() < MAX_QUESTIONS_PER_ATTEMPT
    }

    /// Records a question as asked. Returns `false` without mutating
    /// state if the cap (`|questionsAsked| <= 3`) is already reached.
    pub fn record_question(&mut self, question: String) -> bool {
        if !self.can_ask_question() {
            return false;
        }
        self.questions_asked.push(question);
        true
    }

    pub fn questions_remaining(&self) -> usize {
        MAX_QUESTIONS_PER_ATTEMPT.saturating_sub(self.questions_asked.len())
    }

    pub fn is_capture_window_elapsed(&self) -> bool {
        (Utc::now() - self.created_at).num_seconds() >= CAPTURE_WINDOW_SECONDS
    }

    pub fn reset(&mut self) {
        let session_id = self.session_id.clone();
        let user_id = self.user_id.clone();
        *self = ConversationState::new(session_id, user_id);
    }

    /// Relocates this state onto a new session id on reconnect,
    /// preserving `created_at` so the 5-minute capture timer survives
    /// the migration.
    pub fn migrate_to(&mut self, new_session_id: String) {
        self.session_id = new_session_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fragment_transitions_listening_to_accumulating() {
        let mut state = ConversationState::new("s1".into(), "u1".into());
        assert_eq!(state.phase, ConversationPhase::Listening);
        state.add_fragment("send bob the budget".into(), vec![], 0.8);
        assert_eq!(state.phase, ConversationPhase::Accumulating);
    }

    #[test]
    fn zero_fragment_reset_leaves_listening() {
        let mut state = ConversationState::new("s1".into(), "u1".into());
        state.reset();
        assert_eq!(state.phase, ConversationPhase::Listening);
        assert!(state.fragments.is_empty());
    }

    #[test]
    fn fourth_question_is_refused() {
        let mut state = ConversationState::new("s1".into(), "u1".into());
        assert!(state.record_question("q1".into()));
        assert!(state.record_question("q2".into()));
        assert!(state.record_question("q3".into()));
        assert!(!state.can_ask_question());
        assert!(!state.record_question("q4".into()));
        assert_eq!(state.questions_asked.len(), 3);
    }

    #[test]
    fn combined_transcript_is_pure_function_of_fragments() {
        let mut state = ConversationState::new("s1".into(), "u1".into());
        state.add_fragment("send bob".into(), vec![], 0.5);
        state.add_fragment("the q3 budget".into(), vec![], 0.5);
        assert_eq!(state.combined_transcript(), "send bob the q3 budget");
    }
}
