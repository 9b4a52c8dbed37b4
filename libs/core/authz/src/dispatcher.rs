// [libs/core/authz/src/dispatcher.rs]
use crate::verifier::{verify_for_execution, ExecutionProofs};
use myndlens_domain_models::{
    AuditEvent, AuditEventType, CoreError, DispatchRecord, DispatchStatus, Mio, TenantStatus,
};
use myndlens_infra_store::Store;
use myndlens_telemetry::redact;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const DISPATCH_TIMEOUT_S: u64 = 30;

#[derive(Debug, Serialize)]
struct MioAdapterView {
    mio_id: String,
    action_class: String,
    params: std::collections::HashMap<String, Value>,
    session_id: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct DispatchAdapterPayload {
    mio: MioAdapterView,
    signature: String,
    tenant_id: String,
    session_id: String,
}

/// Translates the signed MIO into the external adapter's wire shape.
fn to_adapter_payload(mio: &Mio, signature: &str, tenant_id: &str, session_id: &str) -> DispatchAdapterPayload {
    let expires_at = mio.header.timestamp + chrono::Duration::seconds(mio.header.ttl_seconds);
    DispatchAdapterPayload {
        mio: MioAdapterView {
            mio_id: mio.header.mio_id.clone(),
            action_class: mio.envelope.action_class.clone(),
            params: mio.envelope.params.clone(),
            session_id: session_id.to_string(),
            expires_at,
        },
        signature: signature.to_string(),
        tenant_id: tenant_id.to_string(),
        session_id: session_id.to_string(),
    }
}

/// Runs the full dispatch sequence. `server_env` is the
/// process's own declared environment; a production dispatch attempt
/// from anywhere else is an unconditional, non-negotiable rejection.
pub async fn dispatch(
    store: &Store,
    http: &Client,
    mio: &Mio,
    signature: &str,
    session_id: &str,
    device_id: &str,
    tenant_id: &str,
    server_env: &str,
    dispatch_target_env: &str,
    proofs: &ExecutionProofs<'_>,
) -> Result<DispatchRecord, CoreError> {
    if dispatch_target_env == "prod" && server_env != "prod" {
        return Err(CoreError::EnvGuard(format!(
            "production dispatch rejected from non-production environment '{server_env}'"
        )));
    }
    if dispatch_target_env != server_env {
        return Err(CoreError::EnvGuard(format!(
            "dispatch target env '{dispatch_target_env}' does not match server env '{server_env}'"
        )));
    }

    verify_for_execution(store, mio, signature, session_id, device_id, proofs)?;

    let idempotency_key = format!("{session_id}:{}", mio.header.mio_id);
    if let Some(existing) = store.dispatches.get(&idempotency_key) {
        info!(idempotency_key = %idempotency_key, "dispatch idempotency hit, returning prior record");
        return Ok(existing);
    }

    let tenant = store
        .tenants
        .get(tenant_id)
        .ok_or_else(|| CoreError::DispatchBlocked(format!("unknown tenant '{tenant_id}'")))?;
    if tenant.status != TenantStatus::Active {
        return Err(CoreError::DispatchBlocked(format!("tenant '{tenant_id}' is not ACTIVE")));
    }

    let payload = to_adapter_payload(mio, signature, tenant_id, session_id);
    let url = format!("{}/v1/dispatch", tenant.endpoint_url.trim_end_matches('/'));

    let started = Instant::now();
    let response = http
        .post(&url)
        .header("X-DISPATCH-TOKEN", &tenant.dispatch_token)
        .header("Idempotency-Key", &idempotency_key)
        .timeout(Duration::from_secs(DISPATCH_TIMEOUT_S))
        .json(&payload)
        .send()
        .await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let status = match response {
        Ok(resp) if resp.status().as_u16() < 400 => DispatchStatus::Submitted,
        Ok(resp) => {
            warn!(status = %resp.status(), url = %redact(&url), "dispatch adapter rejected request");
            DispatchStatus::Rejected
        }
        Err(e) => {
            error!(error = %redact(&e.to_string()), "dispatch adapter call failed");
            DispatchStatus::Rejected
        }
    };

    let record = DispatchRecord::new(
        idempotency_key,
        mio.header.mio_id.clone(),
        session_id.to_string(),
        tenant_id.to_string(),
        mio.envelope.action.clone(),
        status,
        latency_ms,
    );
    store.dispatches.insert(record.clone());

    store.audit.record(
        AuditEvent::new(AuditEventType::ExecuteCompleted)
            .with_session(session_id)
            .with_detail("dispatch_id", record.dispatch_id.clone())
            .with_detail("status", format!("{:?}", record.status)),
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer;
    use chrono::Utc;
    use myndlens_domain_models::{
        Grounding, MioConstraints, MioEnvelope, MioHeader, SecurityProof, Session, Tenant,
    };
    use std::collections::HashMap;

    fn mio() -> Mio {
        Mio {
            header: MioHeader { mio_id: "mio-1".into(), timestamp: Utc::now(), signer_id: "gateway".into(), ttl_seconds: 120 },
            envelope: MioEnvelope {
                action: "send_message".into(),
                action_class: "COMM_SEND".into(),
                params: HashMap::new(),
                constraints: MioConstraints { tier: 0, physical_latch_required: false, biometric_required: false },
            },
            grounding: Grounding {
                transcript_hash: "a".into(),
                l1_hash: "b".into(),
                l2_audit_hash: "c".into(),
                memory_node_ids: vec![],
                provenance_flags: HashMap::new(),
            },
            security_proof: SecurityProof { touch_token: None, signature: None },
        }
    }

    #[tokio::test]
    async fn production_target_from_non_production_server_is_rejected() {
        let store = Store::new();
        let http = Client::new();
        let m = mio();
        let sig = signer::sign(&m).unwrap();
        let result = dispatch(
            &store, &http, &m, &sig, "s1", "d1", "tenant-1", "dev", "prod", &ExecutionProofs::default(),
        )
        .await;
        assert!(matches!(result, Err(CoreError::EnvGuard(_))));
    }

    #[tokio::test]
    async fn unknown_tenant_is_rejected() {
        let store = Store::new();
        let http = Client::new();
        let session = Session::new("u1".into(), "d1".into(), "dev".into(), "1.0.0".into());
        let session_id = session.session_id.clone();
        store.sessions.create(session);
        let m = mio();
        let sig = signer::sign(&m).unwrap();
        let result = dispatch(
            &store, &http, &m, &sig, &session_id, "d1", "nonexistent", "dev", "dev", &ExecutionProofs::default(),
        )
        .await;
        assert!(matches!(result, Err(CoreError::DispatchBlocked(_))));
    }

    #[tokio::test]
    async fn inactive_tenant_is_rejected() {
        let store = Store::new();
        let http = Client::new();
        let session = Session::new("u1".into(), "d1".into(), "dev".into(), "1.0.0".into());
        let session_id = session.session_id.clone();
        store.sessions.create(session);
        store.tenants.upsert(Tenant {
            tenant_id: "tenant-1".into(),
            status: TenantStatus::Suspended,
            endpoint_url: "https://adapter.example.com".into(),
            dispatch_token: "secret".into(),
            env: "dev".into(),
        });
        let m = mio();
        let sig = signer::sign(&m).unwrap();
        let result = dispatch(
            &store, &http, &m, &sig, &session_id, "d1", "tenant-1", "dev", "dev", &ExecutionProofs::default(),
        )
        .await;
        assert!(matches!(result, Err(CoreError::DispatchBlocked(reason)) if reason.contains("ACTIVE")));
    }
}
