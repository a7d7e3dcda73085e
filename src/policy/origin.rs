//! Origin allow-list evaluation
//!
//! Decides which value goes into `Access-Control-Allow-Origin` and whether
//! the request is refused outright. Credentials are always allowed, so the
//! origin is only ever echoed when it is explicitly listed; every other
//! case gets the literal `"null"` marker.
//!
//! | allow-list | Origin header   | allow-origin | rejected |
//! |------------|-----------------|--------------|----------|
//! | empty      | any / absent    | `null`       | no       |
//! | non-empty  | absent          | `null`       | no       |
//! | non-empty  | listed          | echoed       | no       |
//! | non-empty  | not listed      | `null`       | yes (403)|

use std::collections::HashSet;

use hyper::header::{self, HeaderValue};
use hyper::http::response::Builder;

/// Marker sent instead of an origin that may not read the response
pub const NULL_ORIGIN: &str = "null";

/// Methods advertised on every response
pub const ALLOW_METHODS: &str = "GET, OPTIONS";

/// Request headers browsers may send
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Outcome of evaluating a request origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    /// Value for `Access-Control-Allow-Origin`
    pub allow_origin: String,
    /// Whether the request must be refused with 403
    pub rejected: bool,
}

impl CorsDecision {
    fn unrestricted() -> Self {
        Self {
            allow_origin: NULL_ORIGIN.to_string(),
            rejected: false,
        }
    }

    /// Add the full CORS header set to a response builder.
    ///
    /// Applied to every response, errors included, so browsers can read
    /// the status instead of reporting an opaque network failure.
    pub fn apply(&self, builder: Builder) -> Builder {
        let allow_origin = HeaderValue::from_str(&self.allow_origin)
            .unwrap_or_else(|_| HeaderValue::from_static(NULL_ORIGIN));

        builder
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin)
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
            .header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
            .header(header::VARY, "Origin")
    }
}

/// Process-wide origin allow-list, read-only after startup
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: HashSet<String>,
}

impl OriginPolicy {
    /// Build a policy from individual origins
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .filter_map(|o| normalize_origin(o.as_ref()))
            .collect();
        Self { allowed }
    }

    /// Parse a comma-separated list, e.g. `ALLOWED_ORIGINS`
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    /// Whether CORS enforcement is active
    pub fn is_enforcing(&self) -> bool {
        !self.allowed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Decide the CORS outcome for a request origin
    pub fn decide(&self, request_origin: Option<&str>) -> CorsDecision {
        if self.allowed.is_empty() {
            return CorsDecision::unrestricted();
        }

        // Non-browser callers send no Origin
        let Some(origin) = request_origin else {
            return CorsDecision::unrestricted();
        };

        match normalize_origin(origin) {
            Some(normalized) if self.allowed.contains(&normalized) => CorsDecision {
                allow_origin: origin.to_string(),
                rejected: false,
            },
            _ => CorsDecision {
                allow_origin: NULL_ORIGIN.to_string(),
                rejected: true,
            },
        }
    }
}

/// Trim whitespace and a trailing slash so `https://a.example/` matches
/// `https://a.example`. Empty entries are dropped.
fn normalize_origin(origin: &str) -> Option<String> {
    let trimmed = origin.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
