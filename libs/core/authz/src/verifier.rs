// [libs/core/authz/src/verifier.rs]
use crate::signer;
use chrono::Utc;
use myndlens_domain_models::{CoreError, Mio, RiskTier};
use myndlens_infra_store::Store;
use sha2::{Digest, Sha256};

/// Extra proofs accompanying an execute attempt, carried over and
/// above what is already embedded in the MIO: `touchToken?` and
/// `biometricProof?` from the `EXECUTE_REQUEST` payload.
#[derive(Debug, Clone, Default)]
pub struct ExecutionProofs<'a> {
    pub touch_token: Option<&'a str>,
    pub biometric_proof_present: bool,
}

fn token_hash(mio_id: &str, session_id: &str, device_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{mio_id}:{session_id}:{device_id}").as_bytes());
    hex::encode(hasher.finalize())
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// The complete verification pipeline, run in order. Any
/// failed check returns a human-readable reason; only all-pass
/// authorizes dispatch.
pub fn verify_for_execution(
    store: &Store,
    mio: &Mio,
    signature: &str,
    session_id: &str,
    device_id: &str,
    proofs: &ExecutionProofs,
) -> Result<(), CoreError> {
    if !signer::verify(mio, signature) {
        return Err(CoreError::DispatchBlocked("signature invalid".into()));
    }

    let age_seconds = (Utc::now() - mio.header.timestamp).num_seconds();
    if age_seconds > mio.header.ttl_seconds {
        return Err(CoreError::DispatchBlocked(format!(
            "TTL expired: age={age_seconds}s ttl={}s",
            mio.header.ttl_seconds
        )));
    }

    let mio_hash = token_hash(&mio.header.mio_id, session_id, device_id);
    if store.replay.contains(&mio_hash) {
        return Err(CoreError::DispatchBlocked("replay detected".into()));
    }
    store.replay.record(mio_hash, mio.header.ttl_seconds * 2);

    if !store.sessions.check_presence(session_id) {
        return Err(CoreError::DispatchBlocked("presence stale".into()));
    }

    let tier = RiskTier::from_u8(mio.envelope.constraints.tier).unwrap_or(RiskTier::None);

    if tier >= RiskTier::PhysicalLatch {
        let Some(touch_token) = proofs.touch_token else {
            return Err(CoreError::DispatchBlocked("touch token required for tier >= 2".into()));
        };
        let mut hasher = Sha256::new();
        hasher.update(touch_token.as_bytes());
        let touch_hash = hex::encode(hasher.finalize());
        if store.replay.contains(&touch_hash) {
            return Err(CoreError::DispatchBlocked("touch token replay detected".into()));
        }
        store.replay.record(touch_hash, mio.header.ttl_seconds * 2);
    }

    if tier >= RiskTier::Biometric && !proofs.biometric_proof_present {
        return Err(CoreError::DispatchBlocked("biometric proof required for tier >= 3".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use myndlens_domain_models::{Grounding, MioConstraints, MioEnvelope, MioHeader, SecurityProof, Session};
    use std::collections::HashMap;

    fn mio_with_tier(tier: u8) -> Mio {
        Mio {
            header: MioHeader { mio_id: "mio-1".into(), timestamp: Utc::now(), signer_id: "gateway".into(), ttl_seconds: 120 },
            envelope: MioEnvelope {
                action: "send_message".into(),
                action_class: "COMM_SEND".into(),
                params: HashMap::new(),
                constraints: MioConstraints {
                    tier,
                    physical_latch_required: tier >= 2,
                    biometric_required: tier >= 3,
                },
            },
            grounding: Grounding {
                transcript_hash: "abc".into(),
                l1_hash: "def".into(),
                l2_audit_hash: "ghi".into(),
                memory_node_ids: vec![],
                provenance_flags: HashMap::new(),
            },
            security_proof: SecurityProof { touch_token: None, signature: None },
        }
    }

    fn fresh_session(store: &Store) -> (String, String) {
        let session = Session::new("u1".into(), "d1".into(), "dev".into(), "1.0.0".into());
        let session_id = session.session_id.clone();
        let device_id = session.device_id.clone();
        store.sessions.create(session);
        (session_id, device_id)
    }

    #[test]
    fn fully_verified_mio_passes() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mio = mio_with_tier(0);
        let sig = signer::sign(&mio).unwrap();
        assert!(verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default()).is_ok());
    }

    #[test]
    fn replayed_mio_is_rejected_on_second_attempt() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mio = mio_with_tier(0);
        let sig = signer::sign(&mio).unwrap();
        assert!(verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default()).is_ok());
        let second = verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default());
        assert!(matches!(second, Err(CoreError::DispatchBlocked(reason)) if reason.contains("replay")));
    }

    #[test]
    fn expired_ttl_is_rejected() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mut mio = mio_with_tier(0);
        mio.header.timestamp = Utc::now() - chrono::Duration::seconds(200);
        let sig = signer::sign(&mio).unwrap();
        let result = verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default());
        assert!(matches!(result, Err(CoreError::DispatchBlocked(reason)) if reason.contains("TTL")));
    }

    #[test]
    fn tier_two_without_touch_token_is_rejected() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mio = mio_with_tier(2);
        let sig = signer::sign(&mio).unwrap();
        let result = verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default());
        assert!(matches!(result, Err(CoreError::DispatchBlocked(reason)) if reason.contains("touch token")));
    }

    #[test]
    fn tier_two_with_touch_token_passes() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mio = mio_with_tier(2);
        let sig = signer::sign(&mio).unwrap();
        let proofs = ExecutionProofs { touch_token: Some("touch-abc"), biometric_proof_present: false };
        assert!(verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &proofs).is_ok());
    }

    #[test]
    fn tier_three_without_biometric_proof_is_rejected() {
        let store = Store::new();
        let (session_id, device_id) = fresh_session(&store);
        let mio = mio_with_tier(3);
        let sig = signer::sign(&mio).unwrap();
        let proofs = ExecutionProofs { touch_token: Some("touch-abc"), biometric_proof_present: false };
        let result = verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &proofs);
        assert!(matches!(result, Err(CoreError::DispatchBlocked(reason)) if reason.contains("biometric")));
    }

    #[test]
    fn stale_presence_is_rejected() {
        let store = Store::new();
        let session = Session::new("u1".into(), "d1".into(), "dev".into(), "1.0.0".into());
        let session_id = session.session_id.clone();
        let device_id = session.device_id.clone();
        let mut stale = session;
        stale.last_heartbeat_at = Utc::now() - chrono::Duration::seconds(30);
        store.sessions.create(stale);
        let mio = mio_with_tier(0);
        let sig = signer::sign(&mio).unwrap();
        let result = verify_for_execution(&store, &mio, &sig, &session_id, &device_id, &ExecutionProofs::default());
        assert!(matches!(result, Err(CoreError::DispatchBlocked(reason)) if reason.contains("presence")));
    }
}
