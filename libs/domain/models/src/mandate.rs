// [libs/domain/models/src/mandate.rs]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    High,
    Med,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionSource {
    Stated,
    DigitalSelf,
    Inferred,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub value: Option<String>,
    pub source: DimensionSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub role: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub priority: ActionPriority,
    pub dimensions: HashMap<String, Dimension>,
}

/// Lifecycle states for a `Mandate`, tracked by `MandateStore`. Only
/// the edges enumerated in `MandateState::allowed_next` are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MandateState {
    DimensionsExtracted,
    GuardrailsPassed,
    ApprovalPending,
    Approved,
    Provisioning,
    Dispatched,
    Completed,
    Failed,
}

impl MandateState {
    pub fn allowed_next(self) -> &'static [MandateState] {
        use MandateState::*;
        match self {
            DimensionsExtracted => &[GuardrailsPassed, Failed],
            GuardrailsPassed => &[ApprovalPending, Failed],
            ApprovalPending => &[Approved, Failed],
            Approved => &[Provisioning, Failed],
            Provisioning => &[Dispatched, Failed],
            Dispatched => &[Completed, Failed],
            Completed => &[],
            Failed => &[],
        }
    }

    pub fn can_transition_to(self, target: MandateState) -> bool {
        self.allowed_next().contains(&target)
    }

    /// Mandates resumable across a reconnect: everything
    /// still short of approval. Anything later is session-local and
    /// purged on disconnect.
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            MandateState::ApprovalPending | MandateState::DimensionsExtracted | MandateState::GuardrailsPassed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mandate {
    pub mandate_id: String,
    pub intent: String,
    pub summary: String,
    pub people: Vec<Person>,
    pub actions: Vec<Action>,
    pub timing: Option<String>,
    pub location: Option<String>,
    pub preferences: Vec<String>,
    pub constraints: Vec<String>,
    pub missing: Vec<String>,
    pub confidence: f32,
    pub state: MandateState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_edges_are_legal() {
        assert!(MandateState::DimensionsExtracted.can_transition_to(MandateState::GuardrailsPassed));
        assert!(!MandateState::DimensionsExtracted.can_transition_to(MandateState::Dispatched));
        assert!(MandateState::Completed.allowed_next().is_empty());
    }

    #[test]
    fn resumable_states_match_spec() {
        assert!(MandateState::ApprovalPending.is_resumable());
        assert!(MandateState::DimensionsExtracted.is_resumable());
        assert!(MandateState::GuardrailsPassed.is_resumable());
        assert!(!MandateState::Approved.is_resumable());
        assert!(!MandateState::Completed.is_resumable());
    }
}
