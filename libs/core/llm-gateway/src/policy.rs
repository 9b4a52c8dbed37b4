// [libs/core/llm-gateway/src/policy.rs]
use crate::types::{PromptPurpose, SectionId};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Fixed policy for one purpose. A
/// section present in `banned_sections` may never be emitted even if
/// requested.
#[derive(Debug, Clone)]
pub struct PurposePolicy {
    pub required_sections: HashSet<SectionId>,
    pub optional_sections: HashSet<SectionId>,
    pub banned_sections: HashSet<SectionId>,
    pub allowed_tools: HashSet<String>,
    pub token_budget: u32,
}

fn set(sections: &[SectionId]) -> HashSet<SectionId> {
    sections.iter().copied().collect()
}

static POLICIES: Lazy<HashMap<PromptPurpose, PurposePolicy>> = Lazy::new(|| {
    use PromptPurpose::*;
    use SectionId::*;

    let mut m = HashMap::new();

    m.insert(
        ThoughtToIntent,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, OutputSchema, TaskContext]),
            optional_sections: set(&[MemoryRecall]),
            banned_sections: set(&[Tooling, SkillsIndex, WorkspaceBootstrap, SafetyGuardrails]),
            allowed_tools: HashSet::new(),
            token_budget: 4096,
        },
    );

    m.insert(
        DimensionsExtract,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, OutputSchema, TaskContext]),
            optional_sections: set(&[MemoryRecall]),
            banned_sections: set(&[
                Tooling,
                SkillsIndex,
                WorkspaceBootstrap,
                RuntimeCapabilities,
                DimensionsInjected,
                ConflictsSummary,
                SafetyGuardrails,
            ]),
            allowed_tools: HashSet::new(),
            token_budget: 4096,
        },
    );

    m.insert(
        Plan,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, TaskContext, DimensionsInjected, SafetyGuardrails]),
            optional_sections: set(&[MemoryRecall, ConflictsSummary]),
            banned_sections: set(&[Tooling]),
            allowed_tools: HashSet::new(),
            token_budget: 8192,
        },
    );

    m.insert(
        Execute,
        PurposePolicy {
            required_sections: set(&[
                Identity,
                PurposeContract,
                Tooling,
                SafetyGuardrails,
                TaskContext,
                DimensionsInjected,
            ]),
            optional_sections: set(&[RuntimeCapabilities, ConflictsSummary]),
            banned_sections: set(&[MemoryRecall, OutputSchema]),
            allowed_tools: HashSet::new(),
            token_budget: 8192,
        },
    );

    m.insert(
        Verify,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, TaskContext]),
            optional_sections: set(&[ConflictsSummary, DimensionsInjected, MemoryRecall]),
            banned_sections: set(&[Tooling, SkillsIndex, SafetyGuardrails]),
            allowed_tools: HashSet::new(),
            token_budget: 4096,
        },
    );

    m.insert(
        SafetyGate,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, SafetyGuardrails, TaskContext]),
            optional_sections: set(&[DimensionsInjected]),
            banned_sections: set(&[Tooling, SkillsIndex, WorkspaceBootstrap]),
            allowed_tools: HashSet::new(),
            token_budget: 2048,
        },
    );

    m.insert(
        Summarize,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, TaskContext]),
            optional_sections: HashSet::new(),
            banned_sections: set(&[Tooling, SkillsIndex, SafetyGuardrails]),
            allowed_tools: HashSet::new(),
            token_budget: 2048,
        },
    );

    m.insert(
        SubagentTask,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, TaskContext]),
            optional_sections: set(&[Tooling, SafetyGuardrails]),
            banned_sections: set(&[WorkspaceBootstrap, SkillsIndex]),
            allowed_tools: HashSet::new(),
            token_budget: 2048,
        },
    );

    m.insert(
        MicroQuestion,
        PurposePolicy {
            required_sections: set(&[Identity, PurposeContract, TaskContext]),
            optional_sections: set(&[DimensionsInjected]),
            banned_sections: set(&[Tooling, SkillsIndex, WorkspaceBootstrap, MemoryRecall]),
            allowed_tools: HashSet::new(),
            token_budget: 1024,
        },
    );

    m
});

pub fn get_policy(purpose: PromptPurpose) -> &'static PurposePolicy {
    POLICIES.get(&purpose).expect("every PromptPurpose has a policy")
}

/// Thin façade over [`get_policy`] for call sites that want an object
/// rather than a free function.
#[derive(Default, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn get_policy(&self, purpose: PromptPurpose) -> &'static PurposePolicy {
        get_policy(purpose)
    }

    /// Returns `(included, gating_reason)`.
    pub fn should_include_section(&self, purpose: PromptPurpose, section: SectionId) -> (bool, Option<String>) {
        let policy = get_policy(purpose);
        if policy.banned_sections.contains(&section) {
            return (false, Some(format!("banned for purpose {purpose:?}")));
        }
        if policy.required_sections.contains(&section) || policy.optional_sections.contains(&section) {
            return (true, None);
        }
        (false, Some(format!("not in required/optional set for purpose {purpose:?}")))
    }

    pub fn token_budget(&self, purpose: PromptPurpose) -> u32 {
        get_policy(purpose).token_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_purpose_resolves_a_policy() {
        for purpose in [
            PromptPurpose::ThoughtToIntent,
            PromptPurpose::DimensionsExtract,
            PromptPurpose::Plan,
            PromptPurpose::Execute,
            PromptPurpose::Verify,
            PromptPurpose::SafetyGate,
            PromptPurpose::Summarize,
            PromptPurpose::SubagentTask,
            PromptPurpose::MicroQuestion,
        ] {
            get_policy(purpose);
        }
    }

    #[test]
    fn banned_section_is_excluded_even_if_optional_elsewhere() {
        let engine = PolicyEngine;
        let (included, reason) = engine.should_include_section(PromptPurpose::DimensionsExtract, SectionId::Tooling);
        assert!(!included);
        assert!(reason.unwrap().contains("banned"));
    }

    #[test]
    fn required_section_is_always_included() {
        let engine = PolicyEngine;
        let (included, _) = engine.should_include_section(PromptPurpose::Execute, SectionId::SafetyGuardrails);
        assert!(included);
    }
}
