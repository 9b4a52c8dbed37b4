// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V1.0)
 * CLASIFICACIÓN: SHARED VOCABULARY (ESTRATO L1)
 * RESPONSABILIDAD: DEFINICIÓN ÚNICA DE LAS ENTIDADES DEL PLANO DE MANDO
 *
 * Single source of truth for the types that cross crate boundaries:
 * session identity, conversation capture state, the mandate lifecycle,
 * the signed MIO, the commit ledger, and the wire envelope. Every other
 * crate in the workspace depends on this one; this one depends on
 * nothing in the workspace.
 * =================================================================
 */

pub mod audit;
pub mod commit;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod mandate;
pub mod mio;
pub mod rate_limit;
pub mod replay;
pub mod session;
pub mod tenant;
pub mod ws;

pub use audit::{AuditEvent, AuditEventType};
pub use commit::{Commit, CommitState, CommitTransition};
pub use conversation::{Checklist, ChecklistItem, ChecklistSource, ConversationPhase, ConversationState, Fragment};
pub use dispatch::{DispatchRecord, DispatchStatus};
pub use error::CoreError;
pub use mandate::{Action, ActionPriority, Dimension, DimensionSource, Mandate, MandateState, Person};
pub use mio::{Grounding, Mio, MioConstraints, MioEnvelope, MioHeader, RiskTier, SecurityProof};
pub use rate_limit::RateLimitWindow;
pub use replay::ReplayRecord;
pub use session::{HeartbeatRecord, Session};
pub use tenant::{Tenant, TenantStatus};
pub use ws::{Envelope, MessageType};
