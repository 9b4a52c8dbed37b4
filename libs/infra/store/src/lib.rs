// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: IN-MEMORY STORE ROOT (V1.0)
 * CLASIFICACIÓN: EPHEMERAL LEDGER (ESTRATO L3)
 * RESPONSABILIDAD: COLECCIONES LÓGICAS DEL PLANO DE MANDO
 *
 * Sessions, conversation state, commits, mandates, dispatch records,
 * the replay cache, rate-limit windows, audit events, and tenants.
 * Every collection lives in RAM behind a [`DashMap`](dashmap::DashMap)
 * keyed for direct lookup on its hot query path, with a [`sweeper`]
 * daemon that evicts entries past their `expires_at`.
 *
 * None of this is a database adapter: there is no on-disk persistence,
 * only the process-lifetime collections the gateway needs to serve a
 * single connected device fleet.
 * =================================================================
 */

pub mod audit;
pub mod commits;
pub mod dispatches;
pub mod mandates;
pub mod rate_limits;
pub mod replay;
pub mod sessions;
pub mod sweeper;
pub mod tenants;

pub use audit::AuditStore;
pub use commits::CommitStore;
pub use dispatches::DispatchStore;
pub use mandates::MandateStore;
pub use rate_limits::RateLimitStore;
pub use replay::ReplayStore;
pub use sessions::SessionStore;
pub use sweeper::spawn_retention_sweeper;
pub use tenants::TenantStore;

/// Aggregates every logical collection behind a single `Clone`-cheap
/// handle, wiring each repository together as an `Arc<T>` field.
#[derive(Clone, Default)]
pub struct Store {
    pub sessions: std::sync::Arc<SessionStore>,
    pub commits: std::sync::Arc<CommitStore>,
    pub mandates: std::sync::Arc<MandateStore>,
    pub replay: std::sync::Arc<ReplayStore>,
    pub rate_limits: std::sync::Arc<RateLimitStore>,
    pub audit: std::sync::Arc<AuditStore>,
    pub tenants: std::sync::Arc<TenantStore>,
    pub dispatches: std::sync::Arc<DispatchStore>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
