//! Cross-origin policy for credentialed media responses

pub mod origin;

pub use origin::{CorsDecision, OriginPolicy, ALLOW_HEADERS, ALLOW_METHODS, NULL_ORIGIN};
