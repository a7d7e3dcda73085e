//! Identity resolver seam

use async_trait::async_trait;
use hyper::HeaderMap;

/// Opaque internal subject id of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject(pub String);

impl Subject {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the caller of an inbound request.
///
/// `None` means unauthenticated. Implementations must not fail loudly on
/// bad credentials: a malformed or expired session is simply no identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Subject>;
}
