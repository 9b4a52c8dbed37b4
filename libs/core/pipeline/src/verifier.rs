// [libs/core/pipeline/src/verifier.rs]
use myndlens_guardrails::sanitize_for_llm;
use myndlens_llm_gateway::{
    call_llm, CacheClass, LlmProvider, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput,
};
use serde::Deserialize;
use tracing::warn;

/// L2's authoritative shadow derivation. Runs only at draft
/// finalization or execute attempt, never per transcript fragment, and
/// ignores L1's hypothesis while deriving — agreement is checked
/// afterward by [`check_l1_l2_agreement`].
#[derive(Debug, Clone)]
pub struct L2Verdict {
    pub action_class: String,
    pub canonical_target: String,
    pub primary_outcome: String,
    pub risk_tier: u8,
    pub confidence: f32,
    pub chain_of_logic: String,
    pub is_mock: bool,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default = "default_action_class")]
    action_class: String,
    #[serde(default)]
    canonical_target: String,
    #[serde(default)]
    primary_outcome: String,
    #[serde(default)]
    risk_tier: u8,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default)]
    chain_of_logic: String,
}

fn default_action_class() -> String {
    "DRAFT_ONLY".into()
}

fn default_confidence() -> f32 {
    0.5
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        return rest.trim_end_matches("```").trim();
    }
    if let Some(rest) = text.strip_prefix("```") {
        return rest.trim_end_matches("```").trim();
    }
    text
}

fn normalize_class(action: &str) -> String {
    action.trim().to_lowercase().replace([' ', '-'], "_")
}

/// L1/L2 conflict resolution. Action classes are normalized before
/// comparison since L2 may phrase the same class differently from L1
/// (e.g. "Recruiting" vs "TASK_CREATE").
pub fn check_l1_l2_agreement(l1_action: &str, l1_confidence: f32, l2: &L2Verdict) -> Result<(), String> {
    let l1_norm = normalize_class(l1_action);
    let l2_norm = normalize_class(&l2.action_class);

    if l1_norm != l2_norm {
        return Err(format!("action mismatch: L1={l1_action}({l1_norm}) L2={}({l2_norm})", l2.action_class));
    }

    let delta = (l1_confidence - l2.confidence).abs();
    if delta > 0.25 {
        return Err(format!("confidence delta {delta:.2} exceeds 0.25"));
    }

    if l1_confidence < 0.55 || l2.confidence < 0.55 {
        return Err(format!(
            "confidence too low: L1={l1_confidence:.2} L2={:.2} (both must exceed 0.55)",
            l2.confidence
        ));
    }

    Ok(())
}

fn parse_l2_response(response: &str) -> L2Verdict {
    let Ok(raw) = serde_json::from_str::<RawVerdict>(strip_code_fence(response)) else {
        warn!("L2 parse failed, falling back to low-confidence verdict");
        return L2Verdict {
            action_class: "DRAFT_ONLY".into(),
            canonical_target: String::new(),
            primary_outcome: String::new(),
            risk_tier: 0,
            confidence: 0.3,
            chain_of_logic: format!("parse failed: {}", response.chars().take(100).collect::<String>()),
            is_mock: false,
        };
    };

    L2Verdict {
        action_class: raw.action_class,
        canonical_target: raw.canonical_target,
        primary_outcome: raw.primary_outcome,
        risk_tier: raw.risk_tier,
        confidence: raw.confidence,
        chain_of_logic: raw.chain_of_logic,
        is_mock: false,
    }
}

fn mock_l2() -> L2Verdict {
    L2Verdict {
        action_class: "Unknown".into(),
        canonical_target: String::new(),
        primary_outcome: String::new(),
        risk_tier: 0,
        confidence: 0.3,
        chain_of_logic: "mock: provider unavailable".into(),
        is_mock: true,
    }
}

/// Runs L2 Sentry. Must only be invoked at draft finalization or
/// execute attempt — the caller, not this function,
/// enforces that cadence.
pub async fn run_l2_sentry(provider: Option<&dyn LlmProvider>, transcript: &str) -> L2Verdict {
    let Some(provider) = provider else {
        return mock_l2();
    };

    let transcript_clean = sanitize_for_llm(transcript, "l2_sentry");

    let sections = vec![SectionOutput {
        section_id: SectionId::TaskContext,
        content: transcript_clean.clone(),
        priority: 10,
        cache_class: CacheClass::Volatile,
        tokens_est: (transcript_clean.len() / 4) as u32,
        included: true,
        gating_reason: None,
    }];

    let artifact = PromptArtifact::new(
        PromptPurpose::Verify,
        PromptMode::Interactive,
        vec![Message {
            role: "user".into(),
            content: format!(
                "Shadow derivation: independently verify intent from this transcript, ignoring any prior hypothesis.\n{transcript_clean}"
            ),
        }],
        &sections,
    );

    match call_llm(provider, &artifact, "L2_SENTRY").await {
        Ok(response) => parse_l2_response(&response),
        Err(_) => mock_l2(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_absent_yields_unknown_verdict() {
        let verdict = run_l2_sentry(None, "send Bob the budget").await;
        assert!(verdict.is_mock);
        assert_eq!(verdict.action_class, "Unknown");
    }

    #[test]
    fn agreement_requires_matching_normalized_class() {
        let l2 = L2Verdict {
            action_class: "COMM-SEND".into(),
            canonical_target: String::new(),
            primary_outcome: String::new(),
            risk_tier: 0,
            confidence: 0.8,
            chain_of_logic: String::new(),
            is_mock: false,
        };
        assert!(check_l1_l2_agreement("comm_send", 0.8, &l2).is_ok());
    }

    #[test]
    fn agreement_fails_on_large_confidence_delta() {
        let l2 = L2Verdict {
            action_class: "COMM_SEND".into(),
            canonical_target: String::new(),
            primary_outcome: String::new(),
            risk_tier: 0,
            confidence: 0.9,
            chain_of_logic: String::new(),
            is_mock: false,
        };
        assert!(check_l1_l2_agreement("COMM_SEND", 0.5, &l2).is_err());
    }

    #[test]
    fn agreement_fails_when_either_confidence_below_threshold() {
        let l2 = L2Verdict {
            action_class: "COMM_SEND".into(),
            canonical_target: String::new(),
            primary_outcome: String::new(),
            risk_tier: 0,
            confidence: 0.5,
            chain_of_logic: String::new(),
            is_mock: false,
        };
        assert!(check_l1_l2_agreement("COMM_SEND", 0.6, &l2).is_err());
    }

    #[test]
    fn agreement_passes_when_both_high_and_classes_match() {
        let l2 = L2Verdict {
            action_class: "COMM_SEND".into(),
            canonical_target: String::new(),
            primary_outcome: String::new(),
            risk_tier: 0,
            confidence: 0.75,
            chain_of_logic: String::new(),
            is_mock: false,
        };
        assert!(check_l1_l2_agreement("COMM_SEND", 0.70, &l2).is_ok());
    }
}
