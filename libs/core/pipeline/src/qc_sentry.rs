// [libs/core/pipeline/src/qc_sentry.rs]
use myndlens_guardrails::sanitize_for_llm;
use myndlens_llm_gateway::{
    call_llm, CacheClass, LlmProvider, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput,
};
use serde::Deserialize;
use tracing::warn;

/// Severity of a single QC pass verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcSeverity {
    None,
    Nudge,
    Block,
}

/// Result of one adversarial pass: persona drift, capability leak, or
/// harm projection. A pass may only block if it cites
/// transcript spans — the grounding rule enforced in [`parse_qc_response`].
#[derive(Debug, Clone)]
pub struct QcPass {
    pub pass_name: String,
    pub passed: bool,
    pub severity: QcSeverity,
    pub reason: String,
    pub cited_spans: usize,
}

#[derive(Debug, Clone)]
pub struct QcVerdict {
    pub passes: Vec<QcPass>,
    pub overall_pass: bool,
    pub block_reason: Option<String>,
    pub is_mock: bool,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    #[serde(default)]
    #[allow(dead_code)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawPass {
    #[serde(default = "default_pass_name")]
    pass_name: String,
    #[serde(default = "default_true")]
    passed: bool,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    cited_spans: Vec<RawSpan>,
}

fn default_pass_name() -> String {
    "unknown".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    passes: Vec<RawPass>,
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

fn severity_from_str(s: &str) -> QcSeverity {
    match s {
        "nudge" => QcSeverity::Nudge,
        "block" => QcSeverity::Block,
        _ => QcSeverity::None,
    }
}

fn parse_qc_response(response: &str) -> QcVerdict {
    let Ok(raw) = serde_json::from_str::<RawResponse>(strip_code_fence(response)) else {
        warn!("QC parse failed, blocking by default (fail-safe)");
        let block = QcPass {
            pass_name: "qc_verification".into(),
            passed: false,
            severity: QcSeverity::Block,
            reason: "QC verification failed: response could not be parsed. Cannot proceed.".into(),
            cited_spans: 0,
        };
        return QcVerdict {
            block_reason: Some(block.reason.clone()),
            passes: vec![block],
            overall_pass: false,
            is_mock: false,
        };
    };

    let passes: Vec<QcPass> = raw
        .passes
        .into_iter()
        .map(|p| {
            let mut severity = severity_from_str(&p.severity);
            let mut reason = p.reason;
            // Grounding rule: a block with no cited spans downgrades to a nudge.
            if !p.passed && severity == QcSeverity::Block && p.cited_spans.is_empty() {
                severity = QcSeverity::Nudge;
                reason.push_str(" [downgraded: no span evidence]");
                warn!(pass_name = %p.pass_name, "QC grounding rule downgraded block to nudge");
            }
            QcPass { pass_name: p.pass_name, passed: p.passed, severity, reason, cited_spans: p.cited_spans.len() }
        })
        .collect();

    let overall_pass = passes.iter().all(|p| p.passed || p.severity != QcSeverity::Block);
    let block_reason = if overall_pass {
        None
    } else {
        passes.iter().find(|p| !p.passed && p.severity == QcSeverity::Block).map(|p| p.reason.clone())
    };

    QcVerdict { passes, overall_pass, block_reason, is_mock: false }
}

fn mock_qc() -> QcVerdict {
    QcVerdict {
        passes: vec![
            QcPass { pass_name: "persona_drift".into(), passed: true, severity: QcSeverity::None, reason: "mock: no drift".into(), cited_spans: 0 },
            QcPass { pass_name: "capability_leak".into(), passed: true, severity: QcSeverity::None, reason: "mock: minimal capability".into(), cited_spans: 0 },
            QcPass { pass_name: "harm_projection".into(), passed: true, severity: QcSeverity::None, reason: "mock: no harm".into(), cited_spans: 0 },
        ],
        overall_pass: true,
        block_reason: None,
        is_mock: true,
    }
}

/// Runs the three adversarial QC passes. Must run after L2
/// and before MIO signing. Any LLM failure fails safe to a full block,
/// never a silent pass.
pub async fn run_qc_sentry(
    provider: Option<&dyn LlmProvider>,
    transcript: &str,
    intent_summary: &str,
    skill_names: &[String],
    skill_risk: &str,
) -> QcVerdict {
    let Some(provider) = provider else {
        return mock_qc();
    };

    let transcript_clean = sanitize_for_llm(transcript, "qc_sentry");
    let intent_summary_clean = sanitize_for_llm(intent_summary, "qc_sentry");

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
        "QC Adversarial Review: intent='{intent_summary_clean}'\nSkills to be granted: {} (risk: {skill_risk})\n\
         Run 3 adversarial checks: persona_drift, capability_leak, harm_projection. \
         harm_projection must cite specific transcript spans to block.",
        skill_names.join(", ")
    );

    let artifact = PromptArtifact::new(
        PromptPurpose::Verify,
        PromptMode::Interactive,
        vec![Message { role: "user".into(), content: prompt }],
        &sections,
    );

    match call_llm(provider, &artifact, "QC_SENTRY").await {
        Ok(response) => parse_qc_response(&response),
        Err(e) => {
            warn!(error = %e, "QC sentry LLM call failed, blocking for safety");
            QcVerdict {
                passes: vec![QcPass {
                    pass_name: "qc_system".into(),
                    passed: false,
                    severity: QcSeverity::Block,
                    reason: "QC system error. Blocking for safety.".into(),
                    cited_spans: 0,
                }],
                overall_pass: false,
                block_reason: Some("QC system error".into()),
                is_mock: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_flag_passes_all_three_checks() {
        let verdict = run_qc_sentry(None, "send Bob the budget", "send message", &[], "low").await;
        assert!(verdict.overall_pass);
        assert_eq!(verdict.passes.len(), 3);
    }

    #[test]
    fn block_without_cited_spans_downgrades_to_nudge() {
        let response = r#"{"passes": [{"pass_name": "harm_projection", "passed": false, "severity": "block", "reason": "maybe harmful", "cited_spans": []}]}"#;
        let verdict = parse_qc_response(response);
        assert_eq!(verdict.passes[0].severity, QcSeverity::Nudge);
        assert!(verdict.overall_pass);
    }

    #[test]
    fn block_with_cited_spans_stays_blocked() {
        let response = r#"{"passes": [{"pass_name": "harm_projection", "passed": false, "severity": "block", "reason": "harmful", "cited_spans": [{"text": "burn it down"}]}]}"#;
        let verdict = parse_qc_response(response);
        assert_eq!(verdict.passes[0].severity, QcSeverity::Block);
        assert!(!verdict.overall_pass);
        assert!(verdict.block_reason.is_some());
    }

    #[test]
    fn unparsable_response_fails_safe_to_block() {
        let verdict = parse_qc_response("not json at all");
        assert!(!verdict.overall_pass);
        assert!(verdict.block_reason.is_some());
    }
}
