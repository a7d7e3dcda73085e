//! Document shapes read by the gateway

pub mod media;

pub use media::{MediaRecord, MEDIA_COLLECTION};
