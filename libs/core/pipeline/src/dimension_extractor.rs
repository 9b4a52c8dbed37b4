// [libs/core/pipeline/src/dimension_extractor.rs]
use myndlens_guardrails::sanitize_for_llm;
use myndlens_llm_gateway::{
    call_llm, CacheClass, LlmProvider, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Where a dimension's value came from. Never silently guessed: an
/// unresolved dimension is a `missing` entry, not an inferred one with
/// low confidence folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    Stated,
    DigitalSelf,
    Inferred,
    Missing,
}

#[derive(Debug, Clone)]
pub struct DimensionValue {
    pub value: String,
    pub source: DimensionSource,
}

/// Mandate-ready structured document. The intent
/// drives which dimensions matter; the caller's Digital Self recall
/// resolves them.
#[derive(Debug, Clone)]
pub struct MandateDraft {
    pub intent: String,
    pub mandate_summary: String,
    pub dimensions: HashMap<String, DimensionValue>,
    pub missing: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawDimension {
    #[serde(default)]
    value: String,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct RawMandate {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    mandate_summary: String,
    #[serde(default)]
    dimensions: HashMap<String, RawDimension>,
    #[serde(default)]
    missing: Vec<String>,
    #[serde(default)]
    confidence: f32,
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

fn source_from_str(s: &str) -> DimensionSource {
    match s {
        "digital_self" => DimensionSource::DigitalSelf,
        "inferred" => DimensionSource::Inferred,
        "missing" => DimensionSource::Missing,
        _ => DimensionSource::Stated,
    }
}

fn parse_mandate(response: &str, intent: &str) -> MandateDraft {
    let Ok(raw) = serde_json::from_str::<RawMandate>(strip_code_fence(response)) else {
        warn!("mandate dimension parse failed");
        return MandateDraft {
            intent: intent.to_string(),
            mandate_summary: String::new(),
            dimensions: HashMap::new(),
            missing: vec!["parse_error".into()],
            confidence: 0.0,
        };
    };

    let dimensions = raw
        .dimensions
        .into_iter()
        .map(|(key, v)| (key, DimensionValue { value: v.value, source: source_from_str(&v.source) }))
        .collect();

    MandateDraft {
        intent: if raw.intent.is_empty() { intent.to_string() } else { raw.intent },
        mandate_summary: raw.mandate_summary,
        dimensions,
        missing: raw.missing,
        confidence: raw.confidence,
    }
}

fn mock_mandate(transcript: &str, intent: &str, l1_dimensions: &HashMap<String, String>) -> MandateDraft {
    let dimensions = l1_dimensions
        .iter()
        .map(|(k, v)| (k.clone(), DimensionValue { value: v.clone(), source: DimensionSource::Stated }))
        .collect();

    MandateDraft {
        intent: intent.to_string(),
        mandate_summary: transcript.chars().take(80).collect(),
        dimensions,
        missing: vec!["mock_mode".into()],
        confidence: 0.3,
    }
}

/// Extracts the mandate-ready dimension set. The intent
/// determines which dimensions matter; unresolved ones land in
/// `missing` rather than being guessed.
pub async fn extract_mandate_dimensions(
    provider: Option<&dyn LlmProvider>,
    transcript: &str,
    intent: &str,
    sub_intents: &[String],
    l1_dimensions: &HashMap<String, String>,
) -> MandateDraft {
    let Some(provider) = provider else {
        return mock_mandate(transcript, intent, l1_dimensions);
    };

    let transcript_clean = sanitize_for_llm(transcript, "dimension_extractor");

    let sections = vec![SectionOutput {
        section_id: SectionId::TaskContext,
        content: transcript_clean.clone(),
        priority: 10,
        cache_class: CacheClass::Volatile,
        tokens_est: (transcript_clean.len() / 4) as u32,
        included: true,
        gating_reason: None,
    }];

    let prompt = format!(
        "Intent: {intent}\nSub-intents: {}\nUser said: \"{transcript_clean}\"\n\
         Extract every dimension needed for a complete, executable mandate. \
         Tag each with source in {{stated, digital_self, inferred}}; list unresolved dimensions in missing[], never guess.",
        if sub_intents.is_empty() { "none identified".to_string() } else { sub_intents.join(", ") }
    );

    let artifact = PromptArtifact::new(
        PromptPurpose::DimensionsExtract,
        PromptMode::Interactive,
        vec![Message { role: "user".into(), content: prompt }],
        &sections,
    );

    match call_llm(provider, &artifact, "DIMENSION_EXTRACTOR").await {
        Ok(response) => parse_mandate(&response, intent),
        Err(_) => mock_mandate(transcript, intent, l1_dimensions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_flag_marks_missing_mode() {
        let draft = extract_mandate_dimensions(None, "send Bob the budget", "COMM_SEND", &[], &HashMap::new()).await;
        assert!(draft.missing.contains(&"mock_mode".to_string()));
    }

    #[test]
    fn unresolved_dimensions_land_in_missing_not_guessed() {
        let response = r#"{"intent": "COMM_SEND", "mandate_summary": "", "dimensions": {"who": {"value": "Bob", "source": "stated"}}, "missing": ["when"], "confidence": 0.7}"#;
        let draft = parse_mandate(response, "COMM_SEND");
        assert_eq!(draft.dimensions.get("who").unwrap().source, DimensionSource::Stated);
        assert!(draft.missing.contains(&"when".to_string()));
    }

    #[test]
    fn parse_failure_reports_zero_confidence() {
        let draft = parse_mandate("not json", "COMM_SEND");
        assert_eq!(draft.confidence, 0.0);
        assert!(draft.missing.contains(&"parse_error".to_string()));
    }
}
