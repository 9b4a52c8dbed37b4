// [libs/core/llm-gateway/src/types.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every LLM call must declare a purpose. No default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptPurpose {
    ThoughtToIntent,
    DimensionsExtract,
    Plan,
    Execute,
    Verify,
    SafetyGate,
    Summarize,
    SubagentTask,
    MicroQuestion,
}

/// Affects verbosity, refusal style, and explanation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptMode {
    Interactive,
    Batch,
    Silent,
    Audit,
}

/// Canonical section identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    Identity,
    PurposeContract,
    OutputSchema,
    Tooling,
    SafetyGuardrails,
    TaskContext,
    MemoryRecall,
    LearnedExamples,
    DimensionsInjected,
    ConflictsSummary,
    RuntimeCapabilities,
    SkillsIndex,
    WorkspaceBootstrap,
}

/// Determines hashing and caching behavior for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheClass {
    Stable,
    Semistable,
    Volatile,
}

/// Output of one section generator, consumed by the orchestrator and
/// by [`crate::hashing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutput {
    pub section_id: SectionId,
    pub content: String,
    pub priority: i32,
    pub cache_class: CacheClass,
    pub tokens_est: u32,
    pub included: bool,
    pub gating_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// The assembled prompt ready for LLM consumption. This, and nothing
/// else, is what [`crate::gateway::call_llm`] accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArtifact {
    pub prompt_id: String,
    pub purpose: PromptPurpose,
    pub mode: PromptMode,
    pub messages: Vec<Message>,
    pub included_section_ids: Vec<SectionId>,
    pub excluded_section_ids: Vec<SectionId>,
    pub stable_hash: String,
    pub volatile_hash: String,
    pub total_tokens_est: u32,
    pub created_at: DateTime<Utc>,
}

impl PromptArtifact {
    pub fn new(purpose: PromptPurpose, mode: PromptMode, messages: Vec<Message>, sections: &[SectionOutput]) -> Self {
        let included_section_ids = sections.iter().filter(|s| s.included).map(|s| s.section_id).collect();
        let excluded_section_ids = sections.iter().filter(|s| !s.included).map(|s| s.section_id).collect();
        let total_tokens_est = sections.iter().filter(|s| s.included).map(|s| s.tokens_est).sum();
        Self {
            prompt_id: uuid::Uuid::new_v4().to_string(),
            purpose,
            mode,
            messages,
            included_section_ids,
            excluded_section_ids,
            stable_hash: crate::hashing::compute_stable_hash(sections),
            volatile_hash: crate::hashing::compute_volatile_hash(sections),
            total_tokens_est,
            created_at: Utc::now(),
        }
    }
}
