//! Shared types for Postern

pub mod error;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

pub use error::{GatewayError, Result};

/// Error type carried by response bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body: either a buffered message or a relayed upstream stream
pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;
