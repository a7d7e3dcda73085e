//! Postern - private media gateway
//!
//! Answers `GET /media/{object_id}` for authenticated callers, either with a
//! short-lived signed CDN redirect or by streaming the object from storage.
//!
//! ## Architecture
//!
//! ```text
//! Browser ──HTTP──► Postern ──► identity (JWT)
//!                      │
//!                      ├──► MongoDB (owner-scoped lookup)
//!                      │
//!                      ├──► 302 to CDN (signed token)
//!                      └──► object store (streamed fallback)
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod policy;
pub mod proxy;
pub mod routes;
pub mod server;
pub mod services;
pub mod signing;
pub mod types;

pub use config::Args;
pub use types::{GatewayError, Result};
