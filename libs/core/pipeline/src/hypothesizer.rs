// [libs/core/pipeline/src/hypothesizer.rs]
use myndlens_guardrails::sanitize_for_llm;
use myndlens_llm_gateway::{
    call_llm, CacheClass, LlmProvider, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// One ranked guess at what the user wants. Non-authoritative: L1 only
/// ever suggests, L2 (`verifier`) is the derivation that can gate
/// execution.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub hypothesis: String,
    pub action_class: String,
    pub confidence: f32,
    pub dimension_suggestions: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct L1Draft {
    pub hypotheses: Vec<Hypothesis>,
    pub transcript: String,
    pub is_mock: bool,
}

#[derive(Debug, Deserialize)]
struct RawHypothesis {
    #[serde(default)]
    hypothesis: String,
    #[serde(default = "default_action_class")]
    action_class: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default)]
    dimension_suggestions: HashMap<String, String>,
}

fn default_action_class() -> String {
    "DRAFT_ONLY".into()
}

fn default_confidence() -> f32 {
    0.5
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    hypotheses: Vec<RawHypothesis>,
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

fn parse_l1_response(response: &str, transcript: &str) -> L1Draft {
    let Ok(raw) = serde_json::from_str::<RawResponse>(strip_code_fence(response)) else {
        warn!("L1 parse failed, falling back to single low-confidence hypothesis");
        return L1Draft {
            hypotheses: vec![Hypothesis {
                hypothesis: response.chars().take(200).collect(),
                action_class: "DRAFT_ONLY".into(),
                confidence: 0.3,
                dimension_suggestions: HashMap::new(),
            }],
            transcript: transcript.to_string(),
            is_mock: false,
        };
    };

    let hypotheses = raw
        .hypotheses
        .into_iter()
        .take(3)
        .map(|h| Hypothesis {
            hypothesis: h.hypothesis,
            action_class: h.action_class,
            confidence: h.confidence,
            dimension_suggestions: h.dimension_suggestions,
        })
        .collect();

    L1Draft { hypotheses, transcript: transcript.to_string(), is_mock: false }
}

/// Heuristic mock used when no live provider is configured. Ported
/// keyword-for-keyword from the reference fallback so mock-flag runs
/// stay behaviorally identical across implementations.
fn mock_l1(transcript: &str) -> L1Draft {
    let lower = transcript.to_lowercase();

    let hypothesis = if lower.contains("send") && lower.contains("message") {
        Hypothesis {
            hypothesis: "User wants to send a message".into(),
            action_class: "COMM_SEND".into(),
            confidence: 0.85,
            dimension_suggestions: HashMap::from([
                ("what".to_string(), "send message".to_string()),
                ("who".to_string(), extract_name(transcript)),
            ]),
        }
    } else if lower.contains("schedule") || lower.contains("meeting") {
        Hypothesis {
            hypothesis: "User wants to schedule something".into(),
            action_class: "SCHED_MODIFY".into(),
            confidence: 0.80,
            dimension_suggestions: HashMap::from([("what".to_string(), "schedule meeting".to_string())]),
        }
    } else {
        Hypothesis {
            hypothesis: "User is expressing a general request".into(),
            action_class: "DRAFT_ONLY".into(),
            confidence: 0.5,
            dimension_suggestions: HashMap::from([("what".to_string(), transcript.chars().take(50).collect())]),
        }
    };

    L1Draft { hypotheses: vec![hypothesis], transcript: transcript.to_string(), is_mock: true }
}

fn extract_name(text: &str) -> String {
    let lower = text.to_lowercase();
    for marker in ["to ", "from ", "with "] {
        if let Some(pos) = lower.find(marker) {
            let after = &lower[pos + marker.len()..];
            if let Some(word) = after.split_whitespace().next() {
                let mut chars = word.chars();
                return match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                };
            }
        }
    }
    String::new()
}

/// Runs the high-speed intent hypothesis generator. When `provider` is
/// `None` (the mock-flag env gate), falls through to the deterministic
/// heuristic mock without attempting a network call.
pub async fn run_l1_scout(provider: Option<&dyn LlmProvider>, transcript: &str) -> L1Draft {
    let Some(provider) = provider else {
        return mock_l1(transcript);
    };

    let transcript_clean = sanitize_for_llm(transcript, "l1_scout");

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
        PromptPurpose::ThoughtToIntent,
        PromptMode::Interactive,
        vec![Message { role: "user".into(), content: transcript_clean }],
        &sections,
    );

    match call_llm(provider, &artifact, "L1_SCOUT").await {
        Ok(response) => parse_l1_response(&response, transcript),
        Err(_) => mock_l1(transcript),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_flag_routes_to_heuristic_without_provider() {
        let draft = run_l1_scout(None, "please send Bob a message").await;
        assert!(draft.is_mock);
        assert_eq!(draft.hypotheses[0].action_class, "COMM_SEND");
    }

    #[tokio::test]
    async fn schedule_keyword_maps_to_sched_modify() {
        let draft = run_l1_scout(None, "schedule a meeting with the team").await;
        assert_eq!(draft.hypotheses[0].action_class, "SCHED_MODIFY");
    }

    #[tokio::test]
    async fn unrecognized_speech_falls_to_draft_only() {
        let draft = run_l1_scout(None, "I was thinking about the weather").await;
        assert_eq!(draft.hypotheses[0].action_class, "DRAFT_ONLY");
    }

    #[test]
    fn name_extraction_capitalizes_first_letter() {
        assert_eq!(extract_name("send it to bob please"), "Bob");
    }

    #[test]
    fn parse_caps_hypotheses_at_three() {
        let response = r#"{"hypotheses": [
            {"hypothesis": "a", "action_class": "COMM_SEND", "confidence": 0.9},
            {"hypothesis": "b", "action_class": "COMM_SEND", "confidence": 0.8},
            {"hypothesis": "c", "action_class": "COMM_SEND", "confidence": 0.7},
            {"hypothesis": "d", "action_class": "COMM_SEND", "confidence": 0.6}
        ]}"#;
        let draft = parse_l1_response(response, "transcript");
        assert_eq!(draft.hypotheses.len(), 3);
    }
}
