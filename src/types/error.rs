//! Error types for Postern
//!
//! Every variant maps to a status code and a fixed public message. The
//! inner detail is for logs only and never reaches a response body.

use hyper::StatusCode;

/// Main error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request origin is not on the allow-list
    #[error("Origin rejected: {0}")]
    PolicyRejection(String),

    /// No resolvable identity on the request
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Unknown object id, or one the subject may not see
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Object store or locator failure
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PolicyRejection(_) => StatusCode::FORBIDDEN,
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::PolicyRejection(_) => "Origin not allowed",
            Self::AuthenticationRequired => "Authentication required",
            Self::ObjectNotFound(_) | Self::NotFound(_) => "Not Found",
            Self::MethodNotAllowed(_) => "Method not allowed",
            Self::UpstreamUnavailable(_) | Self::Config(_) | Self::Internal(_) => {
                "Internal server error"
            }
        }
    }

    /// Whether a client may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamUnavailable(format!("object store request failed: {}", err))
    }
}

impl From<mongodb::error::Error> for GatewayError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::UpstreamUnavailable(format!("object locator failed: {}", err))
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
