//! JWT session verification
//!
//! Sessions are HS256 tokens minted by the identity provider. The subject
//! id is taken from the `sub` claim. Tokens are read from
//! `Authorization: Bearer <token>` first, then from the session cookie.

use async_trait::async_trait;
use hyper::header::{AUTHORIZATION, COOKIE};
use hyper::HeaderMap;
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::identity::{IdentityResolver, Subject};
use crate::types::GatewayError;

/// Claims the gateway reads from a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Internal subject id
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer, checked when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies session tokens issued by the identity provider
#[derive(Clone)]
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtIdentityResolver {
    /// Create a resolver
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(
        secret: &str,
        issuer: Option<&str>,
        cookie_name: &str,
    ) -> Result<Self, GatewayError> {
        if secret.is_empty() {
            return Err(GatewayError::Config(
                "IDENTITY_JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(GatewayError::Config(
                "IDENTITY_JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self::build(secret, issuer, cookie_name))
    }

    /// Create a resolver for dev mode (fixed, insecure secret)
    pub fn new_dev(cookie_name: &str) -> Self {
        Self::build(
            "dev-mode-secret-not-for-production-use-123456",
            None,
            cookie_name,
        )
    }

    fn build(secret: &str, issuer: Option<&str>, cookie_name: &str) -> Self {
        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer.filter(|i| !i.is_empty()) {
            validation.set_issuer(&[iss]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.to_string(),
        }
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidIssuer => "Invalid issuer",
                    _ => "Token validation failed",
                };
                debug!(reason, "Session token rejected");
                GatewayError::AuthenticationRequired
            })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Subject> {
        let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());

        let token = extract_token_from_header(auth_header)
            .or_else(|| extract_token_from_cookie(cookie_header, &self.cookie_name))?;

        let claims = self.verify(token).ok()?;
        if claims.sub.is_empty() {
            return None;
        }
        Some(Subject(claims.sub))
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format only.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extract a named cookie value from a Cookie header
pub fn extract_token_from_cookie<'a>(
    cookie_header: Option<&'a str>,
    name: &str,
) -> Option<&'a str> {
    cookie_header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
