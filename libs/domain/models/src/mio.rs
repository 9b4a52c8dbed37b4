// [libs/domain/models/src/mio.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordinal gating additional proofs: 0 none, 1 voice latch, 2 physical
/// touch, 3 biometric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RiskTier {
    None = 0,
    VoiceLatch = 1,
    PhysicalLatch = 2,
    Biometric = 3,
}

impl RiskTier {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RiskTier::None),
            1 => Some(RiskTier::VoiceLatch),
            2 => Some(RiskTier::PhysicalLatch),
            3 => Some(RiskTier::Biometric),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MioHeader {
    pub mio_id: String,
    pub timestamp: DateTime<Utc>,
    pub signer_id: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MioConstraints {
    pub tier: u8,
    pub physical_latch_required: bool,
    pub biometric_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MioEnvelope {
    pub action: String,
    pub action_class: String,
    pub params: HashMap<String, serde_json::Value>,
    pub constraints: MioConstraints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grounding {
    pub transcript_hash: String,
    pub l1_hash: String,
    pub l2_audit_hash: String,
    pub memory_node_ids: Vec<String>,
    pub provenance_flags: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityProof {
    pub touch_token: Option<String>,
    pub signature: Option<String>,
}

/// Master Intent Object — the sole artifact that authorizes dispatch.
/// Append-only once `security_proof.signature` is set; the signature
/// itself is computed over every other field via canonical JSON (see
/// `myndlens_authz::signer`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mio {
    pub header: MioHeader,
    pub envelope: MioEnvelope,
    pub grounding: Grounding,
    pub security_proof: SecurityProof,
}

impl Mio {
    /// The document with `security_proof.signature` cleared — this is
    /// the payload that gets signed and later re-verified.
    pub fn unsigned(&self) -> Mio {
        let mut copy = self.clone();
        copy.security_proof.signature = None;
        copy
    }
}
