// [libs/domain/models/src/error.rs]
use thiserror::Error;

/// Taxonomy shared by every stratum so the gateway can map failures to a
/// typed client envelope instead of leaking internal error shapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("AUTH_ERROR: {0}")]
    Auth(String),

    #[error("SESSION_ERROR: {0}")]
    Session(String),

    #[error("PRESENCE_ERROR: {0}")]
    Presence(String),

    #[error("ENV_GUARD_ERROR: {0}")]
    EnvGuard(String),

    #[error("DISPATCH_BLOCKED: {0}")]
    DispatchBlocked(String),

    #[error("PROMPT_BYPASS: {0}")]
    PromptBypass(String),

    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code for the client-facing error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Auth(_) => "AUTH_ERROR",
            CoreError::Session(_) => "SESSION_ERROR",
            CoreError::Presence(_) => "PRESENCE_ERROR",
            CoreError::EnvGuard(_) => "ENV_GUARD_ERROR",
            CoreError::DispatchBlocked(_) => "DISPATCH_BLOCKED",
            CoreError::PromptBypass(_) => "PROMPT_BYPASS",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
