// [apps/gateway/src/services/pipeline_orchestrator.rs]
//! Wires the inference cascade end to end: fragment analysis feeds the
//! checklist; capture-close drives hypothesizer -> verifier -> QC
//! sentry -> dimension extractor -> skill determiner -> guardrails ->
//! commit -> signer -> dispatcher. Each stage's own fail-open/
//! fail-closed behavior for graceful degradation under chained LLM
//! calls is already encoded in `myndlens_pipeline`; this module only
//! sequences the calls and turns their results into store writes and
//! push messages.

use crate::state::AppState;
use myndlens_authz::{dispatch, CommitService, ExecutionProofs};
use myndlens_domain_models::ws::DraftUpdatePayload;
use myndlens_domain_models::{
    Action, ActionPriority, AuditEvent, AuditEventType, Dimension, DimensionSource as MandateDimensionSource,
    DispatchStatus, Envelope, Grounding, Mandate, MandateState, MessageType, Mio, MioConstraints, MioEnvelope,
    MioHeader, RiskTier, SecurityProof,
};
use myndlens_guardrails::{check_guardrails, GuardrailInput, GuardrailResult};
use myndlens_llm_gateway::LlmProvider;
use myndlens_pipeline::skill_determiner::MandateAction;
use myndlens_pipeline::{
    check_l1_l2_agreement, determine_skills, extract_mandate_dimensions, micro_question_for, run_l1_scout,
    run_l2_sentry, run_qc_sentry,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Admits `provider` for `service` only if its circuit breaker is
/// closed or half-open; otherwise returns `None` so the
/// caller falls through to the stage's own deterministic mock rather
/// than hammering a tripped dependency.
fn gate_provider<'a>(
    state: &AppState,
    provider: Option<&'a dyn LlmProvider>,
    service: &str,
) -> Option<&'a dyn LlmProvider> {
    provider.filter(|_| state.breakers.allow(service))
}

/// Records a circuit-breaker outcome for a stage that was actually
/// attempted (`attempted` is `Some`); a stage skipped because the
/// breaker was already open or because `MOCK_LLM` is set leaves the
/// breaker state untouched.
fn record_llm_outcome(state: &AppState, attempted: Option<&dyn LlmProvider>, service: &str, fell_back: bool) {
    if attempted.is_none() {
        return;
    }
    if fell_back {
        state.breakers.record_failure(service);
    } else {
        state.breakers.record_success(service);
    }
}

/// Outcome of closing a capture window and running it through the full
/// mandate pipeline, reported back to the `EXECUTE_REQUEST` /
/// `DRAFT_UPDATE` handlers.
pub enum CaptureOutcome {
    Draft { draft_id: String, action_class: String, confidence: f32, summary: String, unfilled: Vec<String> },
    Blocked { reason: String },
}

/// Runs the fragment -> L1 -> L2 -> QC -> dimensions -> skills cascade
/// for one session's accumulated transcript, then opens a commit for
/// the resulting draft.
pub async fn process_capture_close(state: &AppState, session_id: &str) -> CaptureOutcome {
    let transcript = state
        .store
        .sessions
        .with_conversation(session_id, |c| c.combined_transcript())
        .unwrap_or_default();

    if transcript.trim().is_empty() {
        return CaptureOutcome::Blocked { reason: "nothing was captured".into() };
    }

    let provider = if state.settings.mock_llm { None } else { Some(state.llm_provider.as_ref()) };

    let l1_provider = gate_provider(state, provider, "l1");
    let l1 = run_l1_scout(l1_provider, &transcript).await;
    record_llm_outcome(state, l1_provider, "l1", l1.is_mock);
    let top = l1.hypotheses.first().cloned();
    let Some(top) = top else {
        return CaptureOutcome::Blocked { reason: "no hypothesis produced".into() };
    };

    let l2_provider = gate_provider(state, provider, "l2");
    let l2 = run_l2_sentry(l2_provider, &transcript).await;
    record_llm_outcome(state, l2_provider, "l2", l2.is_mock);
    if let Err(conflict) = check_l1_l2_agreement(&top.action_class, top.confidence, &l2) {
        warn!(session_id, conflict = %conflict, "L1/L2 disagreement, proceeding with reduced trust");
        state.store.audit.record(
            AuditEvent::new(AuditEventType::GuardrailTriggered)
                .with_session(session_id)
                .with_detail("conflict", conflict),
        );
    }

    let guardrail_check = check_guardrails(&GuardrailInput {
        transcript: &transcript,
        ambiguity: None,
        emotional_load: None,
        top_confidence: Some(top.confidence),
    });
    if guardrail_check.result != GuardrailResult::Pass {
        state.store.audit.record(
            AuditEvent::new(AuditEventType::GuardrailTriggered)
                .with_session(session_id)
                .with_detail("result", format!("{:?}", guardrail_check.result))
                .with_detail("reason", guardrail_check.reason.clone()),
        );
        return CaptureOutcome::Blocked { reason: guardrail_check.reason };
    }

    let dimension_provider = gate_provider(state, provider, "dimension_extractor");
    let draft = extract_mandate_dimensions(
        dimension_provider,
        &transcript,
        &top.action_class,
        &l1.hypotheses.iter().map(|h| h.hypothesis.clone()).collect::<Vec<_>>(),
        &top.dimension_suggestions,
    )
    .await;
    record_llm_outcome(state, dimension_provider, "dimension_extractor", draft.missing.iter().any(|m| m == "mock_mode"));

    let library = crate::services::skill_library::seed_library();
    let mandate_action =
        MandateAction { action: top.action_class.clone(), action_class: top.action_class.clone(), description: top.hypothesis.clone() };
    let topology = determine_skills(&[mandate_action], &library);
    let skill_names: Vec<String> =
        topology.sub_agents.iter().flat_map(|s| s.entries.iter().map(|e| e.skill_name.clone())).collect();

    let qc_provider = gate_provider(state, provider, "qc");
    let qc = run_qc_sentry(qc_provider, &transcript, &draft.mandate_summary, &skill_names, "low").await;
    record_llm_outcome(state, qc_provider, "qc", qc.block_reason.as_deref() == Some("QC system error"));
    if !qc.overall_pass {
        let reason = qc.block_reason.unwrap_or_else(|| "QC system error".into());
        state.store.audit.record(AuditEvent::new(AuditEventType::QcBlock).with_session(session_id).with_detail("reason", reason.clone()));
        return CaptureOutcome::Blocked { reason };
    }

    if draft.missing.len() > 1 || (draft.missing.len() == 1 && draft.missing[0] != "mock_mode") {
        if let Some(dimension) = draft.missing.iter().find(|d| *d != "mock_mode") {
            let asked = state
                .store
                .sessions
                .with_conversation(session_id, |c| c.record_question(micro_question_for(dimension)))
                .unwrap_or(false);
            if asked {
                info!(session_id, dimension, "clarifying question recorded");
            }
        }
    }

    let mut dimensions: HashMap<String, serde_json::Value> = HashMap::new();
    for (key, value) in &draft.dimensions {
        dimensions.insert(key.clone(), serde_json::json!(value.value));
    }

    let mandate_actions = vec![Action {
        name: top.action_class.clone(),
        priority: ActionPriority::Med,
        dimensions: draft
            .dimensions
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    Dimension {
                        value: Some(v.value.clone()),
                        source: match v.source {
                            myndlens_pipeline::dimension_extractor::DimensionSource::Stated => MandateDimensionSource::Stated,
                            myndlens_pipeline::dimension_extractor::DimensionSource::DigitalSelf => MandateDimensionSource::DigitalSelf,
                            myndlens_pipeline::dimension_extractor::DimensionSource::Inferred => MandateDimensionSource::Inferred,
                            myndlens_pipeline::dimension_extractor::DimensionSource::Missing => MandateDimensionSource::Missing,
                        },
                    },
                )
            })
            .collect(),
    }];

    let mandate = Mandate {
        mandate_id: uuid::Uuid::new_v4().to_string(),
        intent: draft.intent.clone(),
        summary: draft.mandate_summary.clone(),
        people: vec![],
        actions: mandate_actions,
        timing: None,
        location: None,
        preferences: vec![],
        constraints: vec![],
        missing: draft.missing.clone(),
        confidence: top.confidence,
        state: MandateState::DimensionsExtracted,
    };
    state.store.mandates.put(session_id, mandate);

    let commit_service = CommitService::new(&state.store);
    let draft_id = uuid::Uuid::new_v4().to_string();
    let commit = commit_service.open(session_id.to_string(), draft_id.clone(), draft.mandate_summary.clone(), draft.intent.clone(), dimensions);
    let _ = commit_service.request_confirmation(&commit.commit_id);

    state.store.sessions.with_conversation(session_id, |c| {
        c.phase = myndlens_domain_models::ConversationPhase::ApprovalPending;
    });

    let payload = DraftUpdatePayload {
        draft_id: commit.draft_id.clone(),
        action_class: top.action_class.clone(),
        confidence: top.confidence,
        summary: draft.mandate_summary.clone(),
        unfilled_dimensions: draft.missing.clone(),
    };
    state.push.push(session_id, Envelope::new(MessageType::DraftUpdate, &payload));

    CaptureOutcome::Draft {
        draft_id: commit.draft_id,
        action_class: top.action_class,
        confidence: top.confidence,
        summary: draft.mandate_summary,
        unfilled: draft.missing,
    }
}

pub enum ExecuteOutcome {
    Ok { mio_id: String, dispatch_id: String },
    Blocked { code: myndlens_domain_models::ws::ExecuteBlockedCode, reason: String },
}

/// Signs, verifies, and dispatches an approved draft. `tenant_id`/
/// `dispatch_target_env` are resolved from the validated identity at
/// `AUTH` time and carried on the session.
#[allow(clippy::too_many_arguments)]
pub async fn execute_draft(
    state: &AppState,
    session_id: &str,
    device_id: &str,
    draft_id: &str,
    tenant_id: &str,
    dispatch_target_env: &str,
    touch_token: Option<&str>,
    biometric_proof_present: bool,
) -> ExecuteOutcome {
    use myndlens_domain_models::ws::ExecuteBlockedCode;

    let Some(commit) = state.store.commits.find_by_idempotency_key(&format!("{session_id}:{draft_id}")) else {
        return ExecuteOutcome::Blocked { code: ExecuteBlockedCode::DraftNotFound, reason: "no draft for that id".into() };
    };

    if !state.store.sessions.check_presence(session_id) {
        return ExecuteOutcome::Blocked { code: ExecuteBlockedCode::PresenceStale, reason: "presence is stale".into() };
    }

    let commit_service = CommitService::new(&state.store);
    if commit_service.confirm(&commit.commit_id).is_err() {
        return ExecuteOutcome::Blocked { code: ExecuteBlockedCode::PipelineNotReady, reason: "draft is not ready for execution".into() };
    }

    let mio = Mio {
        header: MioHeader {
            mio_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            signer_id: "gateway".into(),
            ttl_seconds: 120,
        },
        envelope: MioEnvelope {
            action: commit.intent.clone(),
            action_class: commit.intent.clone(),
            params: commit.dimensions.clone(),
            constraints: MioConstraints { tier: RiskTier::None as u8, physical_latch_required: false, biometric_required: false },
        },
        grounding: Grounding {
            transcript_hash: sha256_hex(&commit.intent_summary),
            l1_hash: String::new(),
            l2_audit_hash: String::new(),
            memory_node_ids: vec![],
            provenance_flags: HashMap::new(),
        },
        security_proof: SecurityProof { touch_token: touch_token.map(str::to_string), signature: None },
    };

    let signature = match myndlens_authz::signer::sign(&mio) {
        Ok(sig) => sig,
        Err(e) => return ExecuteOutcome::Blocked { code: ExecuteBlockedCode::PipelineNotReady, reason: e.to_string() },
    };

    if !state.breakers.allow("dispatch") {
        return ExecuteOutcome::Blocked {
            code: ExecuteBlockedCode::PipelineNotReady,
            reason: "dispatch adapter circuit breaker is open".into(),
        };
    }

    let proofs = ExecutionProofs { touch_token, biometric_proof_present };
    let _ = commit_service.begin_dispatch(&commit.commit_id);

    match dispatch(
        &state.store,
        &state.http,
        &mio,
        &signature,
        session_id,
        device_id,
        tenant_id,
        &state.settings.env,
        dispatch_target_env,
        &proofs,
    )
    .await
    {
        Ok(record) => {
            match record.status {
                DispatchStatus::Submitted => state.breakers.record_success("dispatch"),
                DispatchStatus::Rejected => state.breakers.record_failure("dispatch"),
            }
            let _ = commit_service.complete(&commit.commit_id);
            ExecuteOutcome::Ok { mio_id: mio.header.mio_id, dispatch_id: record.dispatch_id }
        }
        Err(e) => {
            // env-guard/tenant/idempotency rejections happen before the
            // adapter is ever called; not an external-call failure.
            let _ = commit_service.fail(&commit.commit_id, &e.to_string());
            let code = match e {
                myndlens_domain_models::CoreError::EnvGuard(_) => ExecuteBlockedCode::EnvGuard,
                _ => ExecuteBlockedCode::GuardrailViolation,
            };
            ExecuteOutcome::Blocked { code, reason: e.to_string() }
        }
    }
}

fn sha256_hex(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}
