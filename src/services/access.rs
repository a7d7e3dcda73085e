//! Media access decisions
//!
//! Each request walks one path through:
//!
//! ```text
//! Unauthenticated ──no subject──→ 401
//!       │
//! Authenticated ──locator miss──→ 404
//!       │
//!   Resolved ──signer ready──→ Signed (302 to CDN)
//!       │
//!       └──SigningUnavailable──→ Proxied (200, streamed)
//! ```
//!
//! Locator and store failures end in `UpstreamUnavailable`. Nothing is
//! written on the way; the only side effect is the store fetch when
//! proxying. No step is retried.

use std::sync::Arc;

use hyper::HeaderMap;
use tracing::{debug, info};

use crate::auth::IdentityResolver;
use crate::db::ObjectLocator;
use crate::proxy::{StorageProxy, StoreObject};
use crate::signing::{SignedAccessToken, SigningUnavailable, TokenSigner};
use crate::types::GatewayError;

/// One inbound media request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Caller-visible object id from the path
    pub object_id: String,
    /// Browser origin, for logging
    pub origin: Option<String>,
    /// Token lifetime asked for via `?ttl=`, clamped by the signer
    pub requested_ttl: Option<u64>,
}

impl AccessRequest {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            origin: None,
            requested_ttl: None,
        }
    }
}

/// How an authorized request is served
#[derive(Debug)]
pub enum AccessOutcome {
    /// Redirect to a signed CDN URL
    Signed(SignedAccessToken),
    /// Relay bytes fetched from the object store
    Proxied(StoreObject),
}

/// Orchestrates identity, location, signing and proxying
pub struct MediaAccessService {
    identity: Arc<dyn IdentityResolver>,
    locator: Arc<dyn ObjectLocator>,
    signer: TokenSigner,
    store: Option<StorageProxy>,
    default_ttl: u64,
}

impl MediaAccessService {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        locator: Arc<dyn ObjectLocator>,
        signer: TokenSigner,
        store: Option<StorageProxy>,
        default_ttl: u64,
    ) -> Self {
        Self {
            identity,
            locator,
            signer,
            store,
            default_ttl,
        }
    }

    /// Whether requests are answered with signed redirects
    pub fn signing_available(&self) -> bool {
        self.signer.is_available()
    }

    /// Whether the streaming fallback is configured
    pub fn proxy_available(&self) -> bool {
        self.store.is_some()
    }

    /// Decide how to serve `request`
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        request: &AccessRequest,
    ) -> Result<AccessOutcome, GatewayError> {
        let subject = self
            .identity
            .resolve(headers)
            .await
            .ok_or(GatewayError::AuthenticationRequired)?;

        let object = self
            .locator
            .locate(&subject, &request.object_id)
            .await?
            .ok_or_else(|| GatewayError::ObjectNotFound(request.object_id.clone()))?;

        debug!(
            object_id = %request.object_id,
            subject = %subject,
            "Object resolved"
        );

        let ttl = request.requested_ttl.unwrap_or(self.default_ttl);
        match self.signer.sign(&object.canonical_path, ttl) {
            Ok(token) => {
                info!(
                    object_id = %request.object_id,
                    expires_at = token.expires_at,
                    "Issued signed URL"
                );
                return Ok(AccessOutcome::Signed(token));
            }
            Err(SigningUnavailable) => {
                debug!(object_id = %request.object_id, "Signing unavailable, proxying");
            }
        }

        let store = self.store.as_ref().ok_or_else(|| {
            GatewayError::Config("neither signing nor object store is configured".into())
        })?;
        let streamed = store.stream(&object.canonical_path).await?;

        info!(
            object_id = %request.object_id,
            content_type = %streamed.content_type,
            "Proxying object"
        );
        Ok(AccessOutcome::Proxied(streamed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Subject;
    use crate::db::{MediaRecord, MemoryObjectLocator, ResolvedObject};
    use crate::signing::MIN_TTL_SECONDS;
    use async_trait::async_trait;
    use hyper::header::{HeaderValue, AUTHORIZATION};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Treats the bearer value as the subject id
    struct BearerIsSubject;

    #[async_trait]
    impl IdentityResolver for BearerIsSubject {
        async fn resolve(&self, headers: &HeaderMap) -> Option<Subject> {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|s| Subject(s.to_string()))
        }
    }

    /// Counts lookups so tests can assert none happened
    #[derive(Default)]
    struct CountingLocator {
        inner: MemoryObjectLocator,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectLocator for CountingLocator {
        async fn locate(
            &self,
            subject: &Subject,
            object_id: &str,
        ) -> Result<Option<ResolvedObject>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.locate(subject, object_id).await
        }
    }

    struct FailingLocator;

    #[async_trait]
    impl ObjectLocator for FailingLocator {
        async fn locate(
            &self,
            _: &Subject,
            _: &str,
        ) -> Result<Option<ResolvedObject>, GatewayError> {
            Err(GatewayError::UpstreamUnavailable("connection refused".into()))
        }
    }

    fn locator() -> Arc<CountingLocator> {
        let locator = CountingLocator::default();
        locator.inner.insert(MediaRecord::new("abc", "user_1", "/u/1/img.png"));
        Arc::new(locator)
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(Some("cdn-secret"), "https://media.example.com", 86_400)
    }

    fn as_user(subject: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", subject)).unwrap(),
        );
        headers
    }

    fn service(
        locator: Arc<dyn ObjectLocator>,
        signer: TokenSigner,
        store: Option<StorageProxy>,
    ) -> MediaAccessService {
        MediaAccessService::new(Arc::new(BearerIsSubject), locator, signer, store, 3600)
    }

    #[tokio::test]
    async fn test_unauthenticated_stops_before_lookup() {
        let locator = locator();
        let svc = service(locator.clone(), signer(), None);

        let err = svc
            .authorize(&HeaderMap::new(), &AccessRequest::new("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationRequired));
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_object_not_found() {
        let svc = service(locator(), signer(), None);
        let err = svc
            .authorize(&as_user("user_1"), &AccessRequest::new("xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ObjectNotFound(id) if id == "xyz"));
    }

    #[tokio::test]
    async fn test_other_users_object_not_found() {
        let svc = service(locator(), signer(), None);
        let err = svc
            .authorize(&as_user("user_2"), &AccessRequest::new("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ObjectNotFound(_)));
    }

    #[tokio::test]
    async fn test_signed_when_secret_configured() {
        let svc = service(locator(), signer(), None);
        assert!(svc.signing_available());

        match svc.authorize(&as_user("user_1"), &AccessRequest::new("abc")).await.unwrap() {
            AccessOutcome::Signed(token) => {
                assert_eq!(token.path, "/u/1/img.png");
                assert!(token.url.starts_with("https://media.example.com/u/1/img.png?token="));
            }
            AccessOutcome::Proxied(_) => panic!("expected signed redirect"),
        }
    }

    #[tokio::test]
    async fn test_requested_ttl_is_clamped() {
        let svc = service(locator(), signer(), None);
        let mut request = AccessRequest::new("abc");
        request.requested_ttl = Some(5);

        let before = chrono::Utc::now().timestamp() as u64;
        match svc.authorize(&as_user("user_1"), &request).await.unwrap() {
            AccessOutcome::Signed(token) => assert!(token.expires_at >= before + MIN_TTL_SECONDS),
            AccessOutcome::Proxied(_) => panic!("expected signed redirect"),
        }
    }

    #[tokio::test]
    async fn test_proxied_when_signing_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zone/u/1/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"png".to_vec(), "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let store =
            StorageProxy::new(&server.uri(), "zone", "key", Duration::from_secs(5)).unwrap();
        let svc = service(locator(), TokenSigner::unavailable(), Some(store));

        match svc.authorize(&as_user("user_1"), &AccessRequest::new("abc")).await.unwrap() {
            AccessOutcome::Proxied(object) => assert_eq!(object.content_type, "image/png"),
            AccessOutcome::Signed(_) => panic!("expected proxy fallback"),
        }
    }

    #[tokio::test]
    async fn test_nothing_configured_is_config_error() {
        let svc = service(locator(), TokenSigner::unavailable(), None);
        let err = svc
            .authorize(&as_user("user_1"), &AccessRequest::new("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn test_locator_failure_is_upstream_error() {
        let svc = service(Arc::new(FailingLocator), signer(), None);
        let err = svc
            .authorize(&as_user("user_1"), &AccessRequest::new("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
    }
}
