// [libs/core/llm-gateway/src/gateway.rs]
use crate::call_sites::{get_call_site, validate_purpose};
use crate::types::PromptArtifact;
use async_trait::async_trait;
use myndlens_domain_models::CoreError;
use myndlens_telemetry::redact;
use tracing::error;

/// The LLM provider boundary. Production wires this to a real HTTP
/// client; tests and the mock-flag startup path use [`MockProvider`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, artifact: &PromptArtifact) -> Result<String, CoreError>;
}

/// Deterministic stand-in that echoes the purpose and prompt id
/// instead of making a network call.
pub struct MockProvider;

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, artifact: &PromptArtifact) -> Result<String, CoreError> {
        Ok(format!("mock-response:{:?}:{}", artifact.purpose, artifact.prompt_id))
    }
}

/// The only allowed way to call an LLM. Enforces, in
/// order: (a) artifact non-null with non-empty `prompt_id` and
/// messages — trivially satisfied by Rust's `&PromptArtifact` owning
/// its fields, so this gate degenerates to non-empty checks; (b) call
/// site registered; (c) purpose allowed for that call site. Any
/// violation is `PROMPT_BYPASS`, audited by the caller via the
/// returned error.
pub async fn call_llm(
    provider: &dyn LlmProvider,
    artifact: &PromptArtifact,
    call_site_id: &str,
) -> Result<String, CoreError> {
    if artifact.prompt_id.is_empty() {
        return Err(bypass("missing_prompt_id", call_site_id));
    }
    if artifact.messages.is_empty() {
        return Err(bypass("empty_messages", call_site_id));
    }
    if get_call_site(call_site_id).is_none() {
        return Err(bypass(&format!("unregistered_site:{call_site_id}"), call_site_id));
    }
    if let Err(reason) = validate_purpose(call_site_id, artifact.purpose) {
        return Err(bypass(&format!("purpose_violation:{reason}"), call_site_id));
    }

    provider.complete(artifact).await
}

fn bypass(reason: &str, call_site_id: &str) -> CoreError {
    error!(call_site = %call_site_id, reason = %redact(reason), "prompt bypass attempt");
    CoreError::PromptBypass(format!("{reason} at {call_site_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CacheClass, Message, PromptMode, PromptPurpose, SectionId, SectionOutput};

    fn artifact(purpose: PromptPurpose) -> PromptArtifact {
        let sections = vec![SectionOutput {
            section_id: SectionId::Identity,
            content: "you are myndlens".into(),
            priority: 0,
            cache_class: CacheClass::Stable,
            tokens_est: 5,
            included: true,
            gating_reason: None,
        }];
        PromptArtifact::new(
            purpose,
            PromptMode::Interactive,
            vec![Message { role: "system".into(), content: "hi".into() }],
            &sections,
        )
    }

    #[tokio::test]
    async fn rejects_unregistered_call_site() {
        let result = call_llm(&MockProvider, &artifact(PromptPurpose::Verify), "NOT_REAL").await;
        assert!(matches!(result, Err(CoreError::PromptBypass(_))));
    }

    #[tokio::test]
    async fn rejects_purpose_not_allowed_for_site() {
        let result = call_llm(&MockProvider, &artifact(PromptPurpose::Execute), "L1_SCOUT").await;
        assert!(matches!(result, Err(CoreError::PromptBypass(_))));
    }

    #[tokio::test]
    async fn allowed_call_succeeds() {
        let result = call_llm(&MockProvider, &artifact(PromptPurpose::ThoughtToIntent), "L1_SCOUT").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejects_empty_messages() {
        let mut a = artifact(PromptPurpose::ThoughtToIntent);
        a.messages.clear();
        let result = call_llm(&MockProvider, &a, "L1_SCOUT").await;
        assert!(matches!(result, Err(CoreError::PromptBypass(_))));
    }
}
