// [libs/core/llm-gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LLM GATEWAY ROOT (V1.0)
 * CLASIFICACIÓN: SOLE PROVIDER CHOKE POINT (ESTRATO L2)
 * RESPONSABILIDAD: ÚNICA VÍA PERMITIDA HACIA UN PROVEEDOR LLM
 *
 * Every call carries a [`PromptArtifact`] built against a purpose's
 * [`policy::PurposePolicy`] and is only dispatched if its call site is
 * registered for that purpose — anything else is a fail-closed
 * `PROMPT_BYPASS`. No module outside this crate may hold a raw
 * provider handle.
 * =================================================================
 */

pub mod call_sites;
pub mod gateway;
pub mod hashing;
pub mod policy;
pub mod types;

pub use call_sites::{get_call_site, validate_purpose, CallSite, CallSiteStatus};
pub use gateway::{call_llm, LlmProvider, MockProvider};
pub use hashing::{compute_stable_hash, compute_volatile_hash};
pub use policy::{get_policy, PolicyEngine, PurposePolicy};
pub use types::{CacheClass, Message, PromptArtifact, PromptMode, PromptPurpose, SectionId, SectionOutput};
