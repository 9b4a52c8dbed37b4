// [libs/core/pipeline/src/fragment_analyzer.rs]
use myndlens_guardrails::sanitize_for_llm;
use myndlens_llm_gateway::{
    call_llm, CacheClass, LlmProvider, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Result of analyzing a single spoken fragment. Designed
/// for `<= 500ms`; never raises — any failure degrades to a
/// low-confidence fallback carrying the raw fragment text.
#[derive(Debug, Clone, Default)]
pub struct FragmentAnalysis {
    pub sub_intents: Vec<String>,
    pub dimensions_found: HashMap<String, String>,
    pub dimensions_missing: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    sub_intents: Vec<String>,
    #[serde(default)]
    dimensions: HashMap<String, serde_json::Value>,
    #[serde(default)]
    confidence: f32,
}

fn fallback(fragment_text: &str) -> FragmentAnalysis {
    FragmentAnalysis {
        sub_intents: vec![fragment_text.chars().take(40).collect()],
        confidence: 0.3,
        ..Default::default()
    }
}

fn parse_response(response: &str) -> FragmentAnalysis {
    let Ok(raw) = serde_json::from_str::<RawResponse>(strip_code_fence(response)) else {
        warn!("fragment analyzer parse failed, falling back to low confidence");
        return FragmentAnalysis { confidence: 0.3, ..Default::default() };
    };

    let mut dimensions_found = HashMap::new();
    let mut dimensions_missing = Vec::new();
    for (key, value) in raw.dimensions {
        let as_str = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        let lower = as_str.to_lowercase();
        if as_str.is_empty() || matches!(lower.as_str(), "missing" | "unknown" | "none") {
            dimensions_missing.push(key);
        } else {
            dimensions_found.insert(key, as_str);
        }
    }

    FragmentAnalysis { sub_intents: raw.sub_intents, dimensions_found, dimensions_missing, confidence: raw.confidence }
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

/// Issues one bounded LLM call through the gateway with purpose
/// `THOUGHT_TO_INTENT`. `provider` is typically the
/// process's configured [`LlmProvider`]; a mock provider (per the
/// `mock flags for STT/TTS/LLM` env gate) returns deterministic text.
pub async fn analyze_fragment(provider: &dyn LlmProvider, fragment_text: &str, accumulated_context: &str) -> FragmentAnalysis {
    let fragment_text_clean = sanitize_for_llm(fragment_text, "fragment_analyzer");
    let accumulated_context_clean = sanitize_for_llm(accumulated_context, "fragment_analyzer");

    let sections = vec![
        SectionOutput {
            section_id: SectionId::Identity,
            content: "fragment analyzer".into(),
            priority: 0,
            cache_class: CacheClass::Stable,
            tokens_est: 20,
            included: true,
            gating_reason: None,
        },
        SectionOutput {
            section_id: SectionId::TaskContext,
            content: format!("fragment={fragment_text_clean}\ncontext={accumulated_context_clean}"),
            priority: 10,
            cache_class: CacheClass::Volatile,
            tokens_est: (fragment_text_clean.len() / 4) as u32,
            included: true,
            gating_reason: None,
        },
    ];

    let artifact = PromptArtifact::new(
        PromptPurpose::ThoughtToIntent,
        PromptMode::Interactive,
        vec![Message { role: "user".into(), content: fragment_text_clean }],
        &sections,
    );

    match call_llm(provider, &artifact, "FRAGMENT_ANALYZER").await {
        Ok(response) => parse_response(&response),
        Err(_) => fallback(fragment_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myndlens_llm_gateway::MockProvider;

    #[tokio::test]
    async fn falls_back_to_low_confidence_on_unparsable_mock_response() {
        let result = analyze_fragment(&MockProvider, "send Bob the Q3 budget", "").await;
        assert!(result.confidence <= 0.3);
        assert!(!result.sub_intents.is_empty());
    }

    #[test]
    fn parses_well_formed_response() {
        let response = r#"{"sub_intents": ["send message"], "dimensions": {"who": "Bob", "where": "missing"}, "confidence": 0.9}"#;
        let parsed = parse_response(response);
        assert_eq!(parsed.confidence, 0.9);
        assert_eq!(parsed.dimensions_found.get("who"), Some(&"Bob".to_string()));
        assert!(parsed.dimensions_missing.contains(&"where".to_string()));
    }

    #[test]
    fn strips_markdown_code_fence() {
        let response = "```json\n{\"sub_intents\": [], \"dimensions\": {}, \"confidence\": 0.5}\n```";
        assert_eq!(parse_response(response).confidence, 0.5);
    }
}
