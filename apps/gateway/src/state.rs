// [apps/gateway/src/state.rs]
//! Shared application state, handed to every handler as an axum
//! extractor. Mirrors the composition-root pattern of aggregating
//! every long-lived collaborator behind one `Arc`-cloneable struct
//! rather than threading each one through individually.

use crate::services::circuit_breaker::CircuitBreakerRegistry;
use crate::services::push::PushRegistry;
use crate::services::token_validator::{JwksKeyProvider, UnconfiguredJwks};
use crate::settings::Settings;
use dashmap::DashMap;
use myndlens_infra_store::Store;
use myndlens_llm_gateway::{LlmProvider, MockProvider};
use myndlens_pipeline::skill_determiner::SkillCandidate;
use std::sync::Arc;

/// Per-session facts resolved once at `AUTH` time that the `Session`
/// domain model itself has no business carrying (tenant routing and
/// subscription gating are gateway concerns, not session identity).
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub tenant_id: String,
    pub subscription_status: String,
    pub dispatch_target_env: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub settings: Arc<Settings>,
    pub llm_provider: Arc<dyn LlmProvider>,
    pub jwks: Arc<dyn JwksKeyProvider>,
    pub http: reqwest::Client,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub push: Arc<PushRegistry>,
    pub skill_library: Arc<Vec<SkillCandidate>>,
    pub identities: Arc<DashMap<String, IdentityContext>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            store: Store::new(),
            settings: Arc::new(settings),
            llm_provider: Arc::new(MockProvider),
            jwks: Arc::new(UnconfiguredJwks),
            http: reqwest::Client::new(),
            breakers: Arc::new(CircuitBreakerRegistry::new()),
            push: Arc::new(PushRegistry::new()),
            skill_library: Arc::new(crate::services::skill_library::seed_library()),
            identities: Arc::new(DashMap::new()),
        }
    }
}
