//! Response builders shared by the routes
//!
//! Every builder takes the request's [`CorsDecision`] so the CORS header
//! set is present on success and failure alike.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::policy::CorsDecision;
use crate::types::{BoxBody, GatewayError};

/// Convert a Full<Bytes> body to BoxBody
pub fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed_unsync())
}

/// Response with no body (preflight, redirects)
pub fn empty_response(status: StatusCode, cors: &CorsDecision) -> Response<BoxBody> {
    cors.apply(Response::builder().status(status))
        .body(Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync())
        .unwrap()
}

/// JSON response
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
    cors: &CorsDecision,
) -> Response<BoxBody> {
    let body = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return error_response(&GatewayError::Internal(e.to_string()), cors);
        }
    };

    to_boxed(
        cors.apply(Response::builder().status(status))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap(),
    )
}

/// Convert a GatewayError to an HTTP response.
///
/// The body holds only the public message; the error detail stays in logs.
pub fn error_response(err: &GatewayError, cors: &CorsDecision) -> Response<BoxBody> {
    let body = serde_json::json!({ "error": err.public_message() });

    to_boxed(
        cors.apply(Response::builder().status(err.status_code()))
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap(),
    )
}
