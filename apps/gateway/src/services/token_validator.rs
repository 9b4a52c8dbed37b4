// [apps/gateway/src/services/token_validator.rs]
//! Token validation for the `AUTH` message. SSO claims are tried
//! first; a legacy signed token is the fallback. Both are validated
//! at the edge before a session is ever created.

use crate::settings::{Settings, SsoValidationMode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use myndlens_domain_models::CoreError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SsoClaims {
    pub obegee_user_id: String,
    pub myndlens_tenant_id: String,
    pub subscription_status: String,
    #[serde(default)]
    pub env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyClaims {
    pub user_id: String,
    pub device_id: String,
    pub session_id: String,
    pub env: String,
}

#[derive(Debug, Clone)]
pub enum ValidatedIdentity {
    Sso { user_id: String, tenant_id: String, subscription_status: String, env: Option<String> },
    Legacy { user_id: String, device_id: String, env: String },
}

/// Seam for the unimplemented `JWKS` validation mode
/// (`SSO_VALIDATION_MODE ∈ {HS256, JWKS}`; production always uses
/// JWKS). Fetching and caching the external issuer's keyset is out of
/// scope here — a real deployment supplies an implementation that
/// fetches `JWKS_URL`.
pub trait JwksKeyProvider: Send + Sync {
    fn decoding_key_for(&self, kid: Option<&str>) -> Result<DecodingKey, CoreError>;
}

/// Placeholder that always fails closed; wiring a real fetcher in is
/// the only thing `JWKS` mode is missing.
pub struct UnconfiguredJwks;

impl JwksKeyProvider for UnconfiguredJwks {
    fn decoding_key_for(&self, _kid: Option<&str>) -> Result<DecodingKey, CoreError> {
        Err(CoreError::Auth("JWKS validation mode is not configured in this deployment".into()))
    }
}

fn try_sso(settings: &Settings, jwks: &dyn JwksKeyProvider, token: &str) -> Option<SsoClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["myndlens"]);
    validation.set_issuer(&["obegee"]);

    let key = match settings.sso_validation_mode {
        SsoValidationMode::Hs256 => DecodingKey::from_secret(settings.sso_hs_secret.as_bytes()),
        SsoValidationMode::Jwks => jwks.decoding_key_for(None).ok()?,
    };

    decode::<SsoClaims>(token, &key, &validation).ok().map(|data| data.claims)
}

fn try_legacy(settings: &Settings, token: &str) -> Option<LegacyClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    let key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
    decode::<LegacyClaims>(token, &key, &validation).ok().map(|data| data.claims)
}

/// Validates an `AUTH` token: SSO claims first, legacy token as
/// fallback. `device_id` from the `AUTH` payload
/// must match the legacy token's own `device_id` claim; the legacy
/// token's `env` must equal the server's own `env`.
pub fn validate_token(
    settings: &Settings,
    jwks: &dyn JwksKeyProvider,
    token: &str,
    device_id: &str,
) -> Result<ValidatedIdentity, CoreError> {
    if let Some(claims) = try_sso(settings, jwks, token) {
        return Ok(ValidatedIdentity::Sso {
            user_id: claims.obegee_user_id,
            tenant_id: claims.myndlens_tenant_id,
            subscription_status: claims.subscription_status,
            env: claims.env,
        });
    }

    if let Some(claims) = try_legacy(settings, token) {
        if claims.device_id != device_id {
            return Err(CoreError::Auth("legacy token device_id mismatch".into()));
        }
        if claims.env != settings.env {
            return Err(CoreError::Auth(format!(
                "legacy token env '{}' does not match server env '{}'",
                claims.env, settings.env
            )));
        }
        return Ok(ValidatedIdentity::Legacy { user_id: claims.user_id, device_id: claims.device_id, env: claims.env });
    }

    Err(CoreError::Auth("token failed both SSO and legacy validation".into()))
}

/// Resolves the effective environment for a dispatch decision: the SSO
/// claim wins when present; if the SSO token carries no `env` claim,
/// the server's own `ENV` is used rather than falling through to a
/// legacy claim that was never part of this auth.
pub fn effective_env(identity: &ValidatedIdentity, server_env: &str) -> String {
    match identity {
        ValidatedIdentity::Sso { env: Some(env), .. } => env.clone(),
        ValidatedIdentity::Sso { env: None, .. } => server_env.to_string(),
        ValidatedIdentity::Legacy { env, .. } => env.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct SsoClaimsWire {
        iss: &'static str,
        aud: &'static str,
        obegee_user_id: String,
        myndlens_tenant_id: String,
        subscription_status: String,
        iat: i64,
        exp: i64,
    }

    #[derive(Serialize)]
    struct LegacyClaimsWire {
        user_id: String,
        device_id: String,
        session_id: String,
        env: String,
        iat: i64,
        exp: i64,
    }

    fn settings() -> Settings {
        Settings {
            env: "dev".into(),
            port: 3000,
            jwt_secret: "legacy-secret".into(),
            jwt_algorithm: "HS256".into(),
            jwt_expiry_seconds: 3600,
            heartbeat_interval_s: 5,
            heartbeat_timeout_s: 15,
            sso_hs_secret: "sso-secret".into(),
            sso_validation_mode: SsoValidationMode::Hs256,
            jwks_url: None,
            dispatch_adapter_ip: None,
            dispatch_token: "dispatch-secret".into(),
            llm_api_key: None,
            log_redaction_enabled: true,
            mock_stt: true,
            mock_tts: true,
            mock_llm: true,
        }
    }

    #[test]
    fn sso_token_is_preferred_over_legacy() {
        let settings = settings();
        let claims = SsoClaimsWire {
            iss: "obegee",
            aud: "myndlens",
            obegee_user_id: "u1".into(),
            myndlens_tenant_id: "t1".into(),
            subscription_status: "ACTIVE".into(),
            iat: 0,
            exp: 9_999_999_999,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"sso-secret")).unwrap();
        let identity = validate_token(&settings, &UnconfiguredJwks, &token, "d1").unwrap();
        assert!(matches!(identity, ValidatedIdentity::Sso { user_id, .. } if user_id == "u1"));
    }

    #[test]
    fn legacy_token_device_id_mismatch_is_rejected() {
        let settings = settings();
        let claims = LegacyClaimsWire {
            user_id: "u1".into(),
            device_id: "other-device".into(),
            session_id: "s1".into(),
            env: "dev".into(),
            iat: 0,
            exp: 9_999_999_999,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"legacy-secret")).unwrap();
        let result = validate_token(&settings, &UnconfiguredJwks, &token, "d1");
        assert!(result.is_err());
    }

    #[test]
    fn garbage_token_fails_both_paths() {
        let settings = settings();
        assert!(validate_token(&settings, &UnconfiguredJwks, "not-a-jwt", "d1").is_err());
    }
}
