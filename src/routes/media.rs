//! Protected media endpoint
//!
//! - `GET /media/{objectId}` - 302 to a signed CDN URL, or 200 with the
//!   object streamed from storage when no signing secret is configured
//! - `OPTIONS /media/{objectId}` - CORS preflight, 204 or 403, no body
//!
//! Optional `?ttl=<seconds>` asks for a token lifetime; it is clamped to
//! the configured window.

use hyper::header::{
    HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED,
    LOCATION, ORIGIN,
};
use hyper::{HeaderMap, Method, Response, StatusCode, Uri};
use tracing::{debug, error, warn};

use crate::policy::CorsDecision;
use crate::proxy::{StoreObject, PROXY_CACHE_CONTROL};
use crate::routes::response::{empty_response, error_response};
use crate::server::AppState;
use crate::services::{AccessOutcome, AccessRequest};
use crate::signing::SignedAccessToken;
use crate::types::{BoxBody, GatewayError};

/// Path prefix of the media endpoint
pub const MEDIA_PREFIX: &str = "/media/";

/// Handle a request under `/media/`
pub async fn handle_media_request(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    cors: &CorsDecision,
) -> Response<BoxBody> {
    // Origin decision comes before path validation
    if cors.rejected {
        debug!(path = %uri.path(), "Origin rejected");
        if *method == Method::OPTIONS {
            return preflight_response(cors);
        }
        return error_response(
            &GatewayError::PolicyRejection(origin_of(headers).unwrap_or_default()),
            cors,
        );
    }

    let Some(object_id) = parse_object_id(uri.path()) else {
        return error_response(&GatewayError::NotFound(uri.path().to_string()), cors);
    };

    if *method == Method::OPTIONS {
        return preflight_response(cors);
    }

    if *method != Method::GET {
        let mut response =
            error_response(&GatewayError::MethodNotAllowed(method.to_string()), cors);
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET, OPTIONS"));
        return response;
    }

    let request = AccessRequest {
        object_id,
        origin: origin_of(headers),
        requested_ttl: parse_ttl(uri.query()),
    };

    match state.access.authorize(headers, &request).await {
        Ok(AccessOutcome::Signed(token)) => redirect_response(&token, cors),
        Ok(AccessOutcome::Proxied(object)) => stream_response(object, cors),
        Err(err) => {
            log_failure(&request, &err);
            error_response(&err, cors)
        }
    }
}

/// Preflight: same policy decision, headers only
fn preflight_response(cors: &CorsDecision) -> Response<BoxBody> {
    let status = if cors.rejected {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::NO_CONTENT
    };
    empty_response(status, cors)
}

/// 302 to the signed CDN URL
fn redirect_response(token: &SignedAccessToken, cors: &CorsDecision) -> Response<BoxBody> {
    let mut response = empty_response(StatusCode::FOUND, cors);
    match HeaderValue::from_str(&token.url) {
        Ok(location) => {
            let headers = response.headers_mut();
            headers.insert(LOCATION, location);
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
            response
        }
        Err(e) => {
            error!(path = %token.path, "Signed URL is not a valid header value: {}", e);
            error_response(&GatewayError::Internal(e.to_string()), cors)
        }
    }
}

/// 200 with the upstream body relayed as it arrives
fn stream_response(object: StoreObject, cors: &CorsDecision) -> Response<BoxBody> {
    let mut builder = cors
        .apply(Response::builder().status(StatusCode::OK))
        .header(CONTENT_TYPE, &object.content_type)
        .header(CACHE_CONTROL, PROXY_CACHE_CONTROL)
        .header("X-Content-Type-Options", "nosniff");

    if let Some(len) = object.content_length {
        builder = builder.header(CONTENT_LENGTH, len);
    }
    if let Some(ref etag) = object.etag {
        builder = builder.header(ETAG, etag);
    }
    if let Some(ref modified) = object.last_modified {
        builder = builder.header(LAST_MODIFIED, modified);
    }

    match builder.body(object.into_body()) {
        Ok(response) => response,
        Err(e) => {
            // Upstream sent a header value hyper refuses to re-emit
            warn!("Failed to build proxied response: {}", e);
            error_response(&GatewayError::Internal(e.to_string()), cors)
        }
    }
}

fn log_failure(request: &AccessRequest, err: &GatewayError) {
    match err {
        GatewayError::AuthenticationRequired | GatewayError::ObjectNotFound(_) => {
            debug!(object_id = %request.object_id, error = %err, "Media request refused");
        }
        _ => {
            error!(
                object_id = %request.object_id,
                retryable = err.is_retryable(),
                error = %err,
                "Media request failed"
            );
        }
    }
}

/// `/media/{id}` → `id`. Rejects empty ids and nested paths.
fn parse_object_id(path: &str) -> Option<String> {
    let raw = path.strip_prefix(MEDIA_PREFIX)?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.is_empty() || decoded.contains('/') {
        return None;
    }
    Some(decoded.into_owned())
}

/// `ttl=<seconds>` from the query string
fn parse_ttl(query: Option<&str>) -> Option<u64> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("ttl="))
        .and_then(|v| v.parse().ok())
}

fn origin_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
