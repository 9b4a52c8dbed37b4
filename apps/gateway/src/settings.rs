// [apps/gateway/src/settings.rs]
//! Startup configuration. Read once at boot into an immutable
//! [`Settings`] and handed around as an `Arc`. Missing fail-safe-
//! required secrets are a hard exit: a gateway that cannot sign or
//! dispatch must not pretend to serve traffic.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsoValidationMode {
    Hs256,
    Jwks,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub jwt_expiry_seconds: i64,
    pub heartbeat_interval_s: u64,
    pub heartbeat_timeout_s: i64,
    pub sso_hs_secret: String,
    pub sso_validation_mode: SsoValidationMode,
    pub jwks_url: Option<String>,
    pub dispatch_adapter_ip: Option<String>,
    pub dispatch_token: String,
    pub llm_api_key: Option<String>,
    pub log_redaction_enabled: bool,
    pub mock_stt: bool,
    pub mock_tts: bool,
    pub mock_llm: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name).map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(default)
}

impl Settings {
    /// Reads every startup environment variable. `JWT_SECRET` and
    /// `DISPATCH_TOKEN` are hard-required; their absence is a fail-safe
    /// hard exit rather than a silently insecure default.
    pub fn from_env() -> Self {
        let env_name = env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() {
            panic!("JWT_SECRET is required and must be non-empty (fail-safe default)");
        }

        let dispatch_token = env::var("DISPATCH_TOKEN").unwrap_or_default();
        if dispatch_token.is_empty() {
            panic!("DISPATCH_TOKEN is required and must be non-empty (fail-safe default)");
        }

        // Production always validates SSO tokens against JWKS regardless
        // of the configured mode.
        let configured_mode = match env::var("SSO_VALIDATION_MODE").as_deref() {
            Ok("JWKS") => SsoValidationMode::Jwks,
            _ => SsoValidationMode::Hs256,
        };
        let sso_validation_mode = if env_name == "prod" { SsoValidationMode::Jwks } else { configured_mode };

        Self {
            port: env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000),
            jwt_secret,
            jwt_algorithm: env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(3600),
            heartbeat_interval_s: env::var("HEARTBEAT_INTERVAL_S").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            heartbeat_timeout_s: env::var("HEARTBEAT_TIMEOUT_S").ok().and_then(|v| v.parse().ok()).unwrap_or(15),
            sso_hs_secret: env::var("SSO_HS_SECRET").unwrap_or_default(),
            sso_validation_mode,
            jwks_url: env::var("JWKS_URL").ok(),
            dispatch_adapter_ip: env::var("DISPATCH_ADAPTER_IP").ok(),
            dispatch_token,
            llm_api_key: env::var("LLM_API_KEY").ok(),
            log_redaction_enabled: env_flag("LOG_REDACTION_ENABLED", true),
            mock_stt: env_flag("MOCK_STT", true),
            mock_tts: env_flag("MOCK_TTS", true),
            mock_llm: env_flag("MOCK_LLM", true),
            env: env_name,
        }
    }
}
