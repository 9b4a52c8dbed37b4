// [libs/core/authz/src/lib.rs]
/*!
 * =================================================================
 * APARATO: AUTHORIZATION & DISPATCH ROOT (V1.0)
 * CLASIFICACIÓN: SOVEREIGN SIGNING AUTHORITY (ESTRATO L2)
 * RESPONSABILIDAD: FIRMA, VERIFICACIÓN Y ENTREGA DEL MANDATO
 *
 * MIO signing and verification, the dispatcher, and the commit state
 * machine service. The only crate in the workspace permitted to
 * produce or check a MIO signature — every dispatch passes through
 * this single choke point.
 * =================================================================
 */

pub mod commit_service;
pub mod dispatcher;
pub mod signer;
pub mod verifier;

pub use commit_service::CommitService;
pub use dispatcher::dispatch;
pub use verifier::{verify_for_execution, ExecutionProofs};
