// [libs/core/authz/src/signer.rs]
use base64::Engine;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use myndlens_domain_models::{CoreError, Mio};
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Process-lifetime keypair, generated on first use. Immutable after
/// first creation.
static SIGNING_KEY: Lazy<RwLock<SigningKey>> = Lazy::new(|| RwLock::new(SigningKey::generate(&mut rand::thread_rng())));

fn canonical_json(mio: &Mio) -> Result<Vec<u8>, CoreError> {
    // `serde_json::Map` is backed by a `BTreeMap` in this workspace
    // (the `preserve_order` feature is not enabled), so converting to
    // `Value` and serializing already yields keys sorted ascending at
    // every nesting level — no extra canonicalization pass needed.
    let value = serde_json::to_value(mio).map_err(|e| CoreError::Internal(format!("mio serialize: {e}")))?;
    serde_json::to_vec(&value).map_err(|e| CoreError::Internal(format!("mio canonicalize: {e}")))
}

/// `Sign(mio) -> base64Signature`. Signs the unsigned
/// view of `mio` (`security_proof.signature` cleared) so the signature
/// never covers itself.
pub fn sign(mio: &Mio) -> Result<String, CoreError> {
    let unsigned = mio.unsigned();
    let bytes = canonical_json(&unsigned)?;
    let key = SIGNING_KEY.read().map_err(|_| CoreError::Internal("signing key lock poisoned".into()))?;
    let signature: Signature = key.sign(&bytes);
    Ok(base64::engine::general_purpose::STANDARD.encode(signature.to_bytes()))
}

/// `Verify(mio, sig) -> bool`. Re-serializes the unsigned
/// view and checks against the current process keypair's public half.
pub fn verify(mio: &Mio, signature_b64: &str) -> bool {
    let Ok(sig_bytes) = base64::engine::general_purpose::STANDARD.decode(signature_b64) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);

    let Ok(bytes) = canonical_json(&mio.unsigned()) else {
        return false;
    };

    let Ok(key) = SIGNING_KEY.read() else {
        return false;
    };
    let verifying_key: VerifyingKey = key.verifying_key();
    verifying_key.verify(&bytes, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use myndlens_domain_models::{Grounding, MioConstraints, MioEnvelope, MioHeader, SecurityProof};
    use std::collections::HashMap;

    fn sample_mio() -> Mio {
        Mio {
            header: MioHeader { mio_id: "mio-1".into(), timestamp: Utc::now(), signer_id: "gateway".into(), ttl_seconds: 120 },
            envelope: MioEnvelope {
                action: "send_message".into(),
                action_class: "COMM_SEND".into(),
                params: HashMap::new(),
                constraints: MioConstraints { tier: 0, physical_latch_required: false, biometric_required: false },
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

    #[test]
    fn signed_mio_verifies() {
        let mio = sample_mio();
        let sig = sign(&mio).unwrap();
        assert!(verify(&mio, &sig));
    }

    #[test]
    fn tampered_mio_fails_verification() {
        let mio = sample_mio();
        let sig = sign(&mio).unwrap();
        let mut tampered = mio.clone();
        tampered.envelope.action = "delete_everything".into();
        assert!(!verify(&tampered, &sig));
    }

    #[test]
    fn malformed_signature_fails_closed() {
        let mio = sample_mio();
        assert!(!verify(&mio, "not-valid-base64!!"));
    }
}
