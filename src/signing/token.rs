//! Time-bounded access tokens
//!
//! `token = base64url(HMAC-SHA256(secret, canonical_path || expires))`
//!
//! The token is appended to the CDN URL together with the decimal expiry:
//! `https://cdn.example.com/u/1/img.png?token=...&expires=1767225600`.
//! Signing is a pure function of secret, path and expiry, so two gateways
//! sharing a secret issue byte-identical URLs for the same inputs.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Shortest lifetime a token may be issued with
pub const MIN_TTL_SECONDS: u64 = 60;

/// Longest lifetime a token may be issued with (one day)
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// No signing secret is configured; callers fall back to proxying
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no signing secret configured")]
pub struct SigningUnavailable;

/// A signed, time-bounded URL for one storage path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAccessToken {
    /// Canonical path the token is bound to
    pub path: String,
    /// Unix timestamp after which the CDN refuses the token
    pub expires_at: u64,
    /// URL-safe base64 digest
    pub digest: String,
    /// Fully qualified CDN URL carrying `token` and `expires`
    pub url: String,
}

/// Issues signed URLs against a CDN base host
#[derive(Clone)]
pub struct TokenSigner {
    /// Keyed MAC, `None` when no secret is configured
    mac: Option<HmacSha256>,
    cdn_base_url: String,
    max_ttl: u64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("available", &self.is_available())
            .field("cdn_base_url", &self.cdn_base_url)
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer. An absent or empty secret yields a signer that
    /// always reports [`SigningUnavailable`].
    ///
    /// `max_ttl_seconds` is itself kept within `[MIN_TTL_SECONDS, MAX_TTL_SECONDS]`.
    pub fn new(secret: Option<&str>, cdn_base_url: &str, max_ttl_seconds: u64) -> Self {
        let mac = secret
            .filter(|s| !s.is_empty())
            .and_then(|s| match HmacSha256::new_from_slice(s.as_bytes()) {
                Ok(mac) => Some(mac),
                Err(e) => {
                    warn!("Signing secret rejected, signed URLs disabled: {}", e);
                    None
                }
            });

        Self {
            mac,
            cdn_base_url: cdn_base_url.trim_end_matches('/').to_string(),
            max_ttl: max_ttl_seconds.clamp(MIN_TTL_SECONDS, MAX_TTL_SECONDS),
        }
    }

    /// Signer with no secret
    pub fn unavailable() -> Self {
        Self::new(None, "", MAX_TTL_SECONDS)
    }

    /// Whether a secret is configured
    pub fn is_available(&self) -> bool {
        self.mac.is_some()
    }

    pub fn max_ttl(&self) -> u64 {
        self.max_ttl
    }

    /// Clamp a requested lifetime into the allowed window
    pub fn clamp_ttl(&self, requested: u64) -> u64 {
        requested.clamp(MIN_TTL_SECONDS, self.max_ttl)
    }

    /// Sign `path` for `ttl_seconds` from now
    pub fn sign(
        &self,
        path: &str,
        ttl_seconds: u64,
    ) -> Result<SignedAccessToken, SigningUnavailable> {
        self.sign_at(path, ttl_seconds, now_epoch_seconds())
    }

    /// Sign `path` for `ttl_seconds` from the given instant
    pub fn sign_at(
        &self,
        path: &str,
        ttl_seconds: u64,
        now: u64,
    ) -> Result<SignedAccessToken, SigningUnavailable> {
        let mac = self.mac.as_ref().ok_or(SigningUnavailable)?;

        let path = canonical_path(path);
        let expires_at = now.saturating_add(self.clamp_ttl(ttl_seconds));
        let digest = URL_SAFE_NO_PAD.encode(compute_mac(mac, &path, expires_at));
        let url = format!(
            "{}{}?token={}&expires={}",
            self.cdn_base_url,
            encode_path(&path),
            digest,
            expires_at
        );

        Ok(SignedAccessToken {
            path,
            expires_at,
            digest,
            url,
        })
    }

    /// Check a token the way the CDN would.
    ///
    /// Returns false when signing is unavailable, the token is malformed,
    /// `now` is past `expires_at`, or the digest does not match.
    pub fn verify(&self, path: &str, expires_at: u64, token: &str, now: u64) -> bool {
        let Some(mac) = self.mac.as_ref() else {
            return false;
        };
        if now > expires_at {
            return false;
        }
        let Ok(expected) = URL_SAFE_NO_PAD.decode(token) else {
            return false;
        };

        let mut mac = mac.clone();
        mac.update(canonical_path(path).as_bytes());
        mac.update(expires_at.to_string().as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

/// Normalize a storage path to exactly one leading `/`
pub fn canonical_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

fn compute_mac(mac: &HmacSha256, path: &str, expires_at: u64) -> Vec<u8> {
    let mut mac = mac.clone();
    mac.update(path.as_bytes());
    mac.update(expires_at.to_string().as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encode each segment, keeping the separators
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn now_epoch_seconds() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
