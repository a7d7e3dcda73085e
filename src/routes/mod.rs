//! HTTP routes for Postern

pub mod health;
pub mod media;
pub mod response;

pub use health::{health_check, version_info};
pub use media::{handle_media_request, MEDIA_PREFIX};
pub use response::{empty_response, error_response, json_response, to_boxed};
