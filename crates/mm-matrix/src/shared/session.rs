//! Session token resolution
//!
//! Session tokens are JWTs signed with a shared secret. The subject (`sub`)
//! names the acting principal. A token that is missing, malformed, expired or
//! signed with another key yields an empty id, which downstream checks treat
//! as "not a manager".

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SessionClaims {
    #[serde(default)]
    sub: String,
}

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies session tokens and reads their subject
#[derive(Clone)]
pub struct SessionVerifier {
    /// `None` when no key is configured: every token is rejected
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl SessionVerifier {
    /// HMAC-signed tokens (`HS256`, `HS384` or `HS512`)
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Self {
        let decoding_key = (!secret.is_empty()).then(|| DecodingKey::from_secret(secret));
        Self {
            decoding_key,
            validation: Validation::new(algorithm),
        }
    }

    /// Verifier that accepts no token
    pub fn disabled() -> Self {
        Self {
            decoding_key: None,
            validation: Validation::default(),
        }
    }

    /// Allowed clock skew for `exp`/`nbf`
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.decoding_key.is_some()
    }

    /// Subject of a verified session token, or an empty string.
    pub fn actor_id(&self, token: Option<&str>) -> String {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return String::new();
        };
        let Some(key) = &self.decoding_key else {
            warn!("No session key configured, treating actor as anonymous");
            return String::new();
        };

        match decode::<SessionClaims>(token, key, &self.validation) {
            Ok(data) => data.claims.sub,
            Err(e) => {
                warn!(error = %e, "Session token rejected, treating actor as anonymous");
                String::new()
            }
        }
    }
}

impl Default for SessionVerifier {
    fn default() -> Self {
        Self::disabled()
    }
}
