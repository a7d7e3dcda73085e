//! Object store client
//!
//! Used when no signing secret is configured: the gateway fetches the
//! object itself and relays the bytes to the client as they arrive.
//!
//! ```text
//! Browser → Postern ──AccessKey header──→ https://{host}/{zone}/{path}
//!              ↑                                   │
//!              └─────────── byte stream ───────────┘
//! ```
//!
//! The access key travels in the `AccessKey` request header, never in the
//! URL. Upstream error bodies are dropped; only the status is logged.

use std::time::Duration;

use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use tracing::{debug, warn};

use crate::signing::token::{canonical_path, encode_path};
use crate::types::{BoxBody, BoxError, GatewayError};

/// Content type used when the store does not send one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Private, short-lived caching for proxied media
pub const PROXY_CACHE_CONTROL: &str = "private, max-age=300";

/// Request header carrying the storage zone password
const ACCESS_KEY_HEADER: &str = "AccessKey";

/// Client for one storage zone
#[derive(Clone)]
pub struct StorageProxy {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
    header_timeout: Duration,
}

impl std::fmt::Debug for StorageProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProxy")
            .field("base_url", &self.base_url)
            .field("header_timeout", &self.header_timeout)
            .finish_non_exhaustive()
    }
}

impl StorageProxy {
    /// Create a client for `{host}/{zone}`.
    ///
    /// `host` may carry a scheme (`http://127.0.0.1:9000`); bare hosts get
    /// `https://`. `request_timeout` bounds connecting and receiving the
    /// response headers, not the body, so large objects are not cut off.
    pub fn new(
        host: &str,
        zone: &str,
        access_key: &str,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let host = host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        let zone = zone.trim_matches('/');
        let base_url = if zone.is_empty() {
            base
        } else {
            format!("{}/{}", base, zone)
        };

        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build storage client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            access_key: access_key.to_string(),
            header_timeout: request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `path` from the store.
    ///
    /// Dropping the returned object (or the body built from it) aborts the
    /// upstream transfer.
    pub async fn stream(&self, path: &str) -> Result<StoreObject, GatewayError> {
        let url = format!("{}{}", self.base_url, encode_path(&canonical_path(path)));

        debug!(path = %path, "Fetching from object store");

        let request = self
            .client
            .get(&url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .send();

        let response = tokio::time::timeout(self.header_timeout, request)
            .await
            .map_err(|_| {
                warn!(path = %path, "Object store timed out");
                GatewayError::UpstreamUnavailable("object store timed out".into())
            })??;

        let status = response.status();
        if !status.is_success() {
            warn!(path = %path, status = %status, "Object store returned error status");
            return Err(GatewayError::UpstreamUnavailable(format!(
                "object store returned {}",
                status
            )));
        }

        Ok(StoreObject::from_response(response))
    }
}

/// A successful store response whose body has not been read yet
#[derive(Debug)]
pub struct StoreObject {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    response: reqwest::Response,
}

impl StoreObject {
    fn from_response(response: reqwest::Response) -> Self {
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        let content_type = header(CONTENT_TYPE)
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let content_length = header(CONTENT_LENGTH).and_then(|v| v.parse().ok());
        let etag = header(ETAG);
        let last_modified = header(LAST_MODIFIED);

        Self {
            content_type,
            content_length,
            etag,
            last_modified,
            response,
        }
    }

    /// Turn the upstream body into a streaming response body
    pub fn into_body(self) -> BoxBody {
        let stream = self
            .response
            .bytes_stream()
            .map_ok(Frame::data)
            .map_err(|e| Box::new(e) as BoxError);
        StreamBody::new(stream).boxed_unsync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn proxy(server: &MockServer) -> StorageProxy {
        StorageProxy::new(&server.uri(), "zone", "secret-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url() {
        let p = StorageProxy::new("storage.example.com", "/zone/", "k", Duration::from_secs(1))
            .unwrap();
        assert_eq!(p.base_url(), "https://storage.example.com/zone");

        let p = StorageProxy::new("http://127.0.0.1:9000/", "zone", "k", Duration::from_secs(1))
            .unwrap();
        assert_eq!(p.base_url(), "http://127.0.0.1:9000/zone");
    }

    #[test]
    fn test_debug_hides_access_key() {
        let p = StorageProxy::new(
            "storage.example.com",
            "zone",
            "super-secret",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{:?}", p).contains("super-secret"));
    }

    #[tokio::test]
    async fn test_stream_relays_bytes_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zone/u/1/img.png"))
            .and(header("AccessKey", "secret-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(PNG.to_vec(), "image/png")
                    .insert_header("ETag", "\"abc\""),
            )
            .expect(1)
            .mount(&server)
            .await;

        let object = proxy(&server).stream("u/1/img.png").await.unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.etag.as_deref(), Some("\"abc\""));

        let bytes = object.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], PNG);

        // Key only in the header, never in the URL
        let received = server.received_requests().await.unwrap();
        assert!(!received[0].url.as_str().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_binary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let object = proxy(&server).stream("/blob").await.unwrap();
        assert_eq!(object.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad AccessKey for zone"))
            .expect(1)
            .mount(&server)
            .await;

        let err = proxy(&server).stream("/u/1/img.png").await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
        assert!(!err.to_string().contains("bad AccessKey"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_upstream_unavailable() {
        let p =
            StorageProxy::new("http://127.0.0.1:1", "zone", "k", Duration::from_secs(2)).unwrap();
        let err = p.stream("/u/1/img.png").await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
    }
}
