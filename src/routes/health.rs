//! Health check endpoints
//!
//! - /health, /healthz - Liveness probe (is the gateway running?)
//! - /version - Build information for deployment verification
//!
//! Liveness does not touch MongoDB or the object store; the database
//! connection is made lazily on the first media lookup.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::policy::CorsDecision;
use crate::routes::response::json_response;
use crate::server::AppState;
use crate::types::BoxBody;

/// Liveness response
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    /// Operating mode
    pub mode: &'static str,
    pub node_id: String,
    /// How media requests are currently served
    pub delivery: DeliveryStatus,
    /// Whether ALLOWED_ORIGINS is non-empty
    #[serde(rename = "corsEnforced")]
    pub cors_enforced: bool,
}

#[derive(Serialize)]
pub struct DeliveryStatus {
    /// Signed CDN redirects available
    pub signing: bool,
    /// Streaming fallback available
    pub proxy: bool,
}

/// Build information captured by build.rs
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub git_commit_full: &'static str,
    pub build_timestamp: &'static str,
}

/// GET /health
pub fn health_check(state: &AppState, cors: &CorsDecision) -> Response<BoxBody> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode { "development" } else { "production" },
        node_id: state.args.node_id.to_string(),
        delivery: DeliveryStatus {
            signing: state.access.signing_available(),
            proxy: state.access.proxy_available(),
        },
        cors_enforced: state.policy.is_enforcing(),
    };

    json_response(StatusCode::OK, &response, cors)
}

/// GET /version
pub fn version_info(cors: &CorsDecision) -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        git_commit: env!("GIT_COMMIT_SHORT"),
        git_commit_full: env!("GIT_COMMIT_FULL"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
    };

    json_response(StatusCode::OK, &response, cors)
}
