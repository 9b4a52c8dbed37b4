// [libs/core/llm-gateway/src/call_sites.rs]
use crate::types::PromptPurpose;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSiteStatus {
    Active,
    Reserved,
    Deprecated,
}

/// A registered LLM call site. Every
/// site that calls the LLM gateway must appear here; unregistered
/// calls are a fail-closed bypass attempt.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub call_site_id: &'static str,
    pub allowed_purposes: HashSet<PromptPurpose>,
    pub owner_module: &'static str,
    pub status: CallSiteStatus,
}

fn purposes(p: &[PromptPurpose]) -> HashSet<PromptPurpose> {
    p.iter().copied().collect()
}

static CALL_SITES: Lazy<HashMap<&'static str, CallSite>> = Lazy::new(|| {
    use CallSiteStatus::*;
    use PromptPurpose::*;

    let sites = [
        CallSite {
            call_site_id: "L1_SCOUT",
            allowed_purposes: purposes(&[ThoughtToIntent, DimensionsExtract]),
            owner_module: "pipeline::hypothesizer",
            status: Active,
        },
        CallSite {
            call_site_id: "FRAGMENT_ANALYZER",
            allowed_purposes: purposes(&[ThoughtToIntent]),
            owner_module: "pipeline::fragment_analyzer",
            status: Active,
        },
        CallSite {
            call_site_id: "L2_SENTRY",
            allowed_purposes: purposes(&[Verify, SafetyGate]),
            owner_module: "pipeline::verifier",
            status: Active,
        },
        CallSite {
            call_site_id: "QC_SENTRY",
            allowed_purposes: purposes(&[Verify]),
            owner_module: "pipeline::qc_sentry",
            status: Active,
        },
        CallSite {
            call_site_id: "GUARDRAILS_CLASSIFIER",
            allowed_purposes: purposes(&[SafetyGate]),
            owner_module: "guardrails::engine",
            status: Active,
        },
        CallSite {
            call_site_id: "DIMENSION_EXTRACTOR",
            allowed_purposes: purposes(&[DimensionsExtract]),
            owner_module: "pipeline::dimension_extractor",
            status: Active,
        },
        CallSite {
            call_site_id: "SKILL_DETERMINER",
            allowed_purposes: purposes(&[Plan]),
            owner_module: "pipeline::skill_determiner",
            status: Active,
        },
        CallSite {
            call_site_id: "MICRO_QUESTION_GENERATOR",
            allowed_purposes: purposes(&[MicroQuestion]),
            owner_module: "pipeline::conversation",
            status: Active,
        },
        CallSite {
            call_site_id: "SUMMARIZER",
            allowed_purposes: purposes(&[Summarize]),
            owner_module: "gateway::handlers::stream",
            status: Reserved,
        },
        CallSite {
            call_site_id: "SUBAGENT_TASK",
            allowed_purposes: purposes(&[SubagentTask]),
            owner_module: "pipeline::skill_determiner",
            status: Reserved,
        },
    ];

    sites.into_iter().map(|s| (s.call_site_id, s)).collect()
});

pub fn get_call_site(call_site_id: &str) -> Option<&'static CallSite> {
    CALL_SITES.get(call_site_id)
}

pub fn validate_purpose(call_site_id: &str, purpose: PromptPurpose) -> Result<(), String> {
    let site = get_call_site(call_site_id).ok_or_else(|| format!("unregistered LLM call site: {call_site_id}"))?;
    if !site.allowed_purposes.contains(&purpose) {
        return Err(format!("purpose {purpose:?} not allowed for call site {call_site_id}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_site_is_rejected() {
        assert!(get_call_site("NOT_REAL").is_none());
        assert!(validate_purpose("NOT_REAL", PromptPurpose::Verify).is_err());
    }

    #[test]
    fn purpose_outside_allow_list_is_rejected() {
        assert!(validate_purpose("L1_SCOUT", PromptPurpose::Execute).is_err());
    }

    #[test]
    fn allowed_purpose_passes() {
        assert!(validate_purpose("L1_SCOUT", PromptPurpose::ThoughtToIntent).is_ok());
    }
}
