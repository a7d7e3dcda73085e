//! Signed CDN URLs for private media
//!
//! A signed URL lets the CDN serve an object directly until its expiry,
//! without routing bytes through the gateway.

pub mod token;

pub use token::{
    canonical_path, SignedAccessToken, SigningUnavailable, TokenSigner, MAX_TTL_SECONDS,
    MIN_TTL_SECONDS,
};
