//! Identity resolution for media requests
//!
//! The gateway only needs to know *who* is asking, or that nobody is.
//! Sessions are issued elsewhere; this module verifies them.

pub mod identity;
pub mod jwt;

pub use identity::{IdentityResolver, Subject};
pub use jwt::{extract_token_from_cookie, extract_token_from_header, Claims, JwtIdentityResolver};
