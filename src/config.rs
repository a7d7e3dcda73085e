//! Configuration for Postern
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use uuid::Uuid;

use crate::db::schemas::MEDIA_COLLECTION;
use crate::policy::OriginPolicy;
use crate::signing::{MAX_TTL_SECONDS, MIN_TTL_SECONDS};

/// Postern - private media gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "postern")]
#[command(
    about = "Authenticated access to private media: signed CDN redirects or streamed proxying"
)]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (insecure identity secret allowed)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Timeout for upstream calls (connect + response headers) in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Comma-separated browser origins allowed to receive credentialed responses.
    /// Empty disables CORS enforcement.
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "")]
    pub allowed_origins: String,

    /// Object store configuration
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Signed URL configuration
    #[command(flatten)]
    pub signing: SigningArgs,

    /// Identity provider configuration
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "postern")]
    pub mongodb_db: String,

    /// Collection holding media documents
    #[arg(long, env = "MEDIA_COLLECTION", default_value = MEDIA_COLLECTION)]
    pub media_collection: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Object store connection
#[derive(Parser, Debug, Clone)]
pub struct StorageArgs {
    /// Storage API host (scheme optional, https assumed)
    #[arg(long, env = "STORAGE_HOST", default_value = "storage.bunnycdn.com")]
    pub storage_host: String,

    /// Storage zone name
    #[arg(long, env = "STORAGE_ZONE")]
    pub storage_zone: Option<String>,

    /// Storage zone access key, sent as a request header
    #[arg(long, env = "STORAGE_ACCESS_KEY", hide_env_values = true)]
    pub storage_access_key: Option<String>,
}

/// Signed CDN URL settings
#[derive(Parser, Debug, Clone)]
pub struct SigningArgs {
    /// CDN base URL signed links point at (e.g. "https://media.example.com")
    #[arg(long, env = "CDN_BASE_URL")]
    pub cdn_base_url: Option<String>,

    /// Token authentication key. Unset means every request is proxied.
    #[arg(long, env = "SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,

    /// Default token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECONDS", default_value = "3600")]
    pub token_ttl_seconds: u64,

    /// Longest token lifetime a caller may request, in seconds
    #[arg(long, env = "TOKEN_TTL_MAX_SECONDS", default_value = "86400")]
    pub token_ttl_max_seconds: u64,
}

/// Session verification settings
#[derive(Parser, Debug, Clone)]
pub struct IdentityArgs {
    /// HS256 secret shared with the identity provider (required in production)
    #[arg(long, env = "IDENTITY_JWT_SECRET", hide_env_values = true)]
    pub identity_jwt_secret: Option<String>,

    /// Expected `iss` claim (optional)
    #[arg(long, env = "IDENTITY_ISSUER")]
    pub identity_issuer: Option<String>,

    /// Cookie holding the session token when no Authorization header is sent
    #[arg(long, env = "SESSION_COOKIE", default_value = "__session")]
    pub session_cookie: String,
}

impl Args {
    /// Origin allow-list parsed from `ALLOWED_ORIGINS`
    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::from_csv(&self.allowed_origins)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Signing secret, if set and non-empty
    pub fn signing_secret(&self) -> Option<&str> {
        self.signing
            .signing_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    /// Storage zone and key, if both are set
    pub fn storage_credentials(&self) -> Option<(&str, &str)> {
        let zone = self.storage.storage_zone.as_deref().filter(|z| !z.is_empty())?;
        let key = self
            .storage
            .storage_access_key
            .as_deref()
            .filter(|k| !k.is_empty())?;
        Some((zone, key))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.identity.identity_jwt_secret.is_none() {
            return Err("IDENTITY_JWT_SECRET is required in production mode".to_string());
        }

        if self.signing_secret().is_some()
            && self
                .signing
                .cdn_base_url
                .as_deref()
                .map_or(true, str::is_empty)
        {
            return Err("CDN_BASE_URL is required when SIGNING_SECRET is set".to_string());
        }

        if self.signing_secret().is_none() && self.storage_credentials().is_none() {
            return Err(
                "Either SIGNING_SECRET or STORAGE_ZONE + STORAGE_ACCESS_KEY must be configured"
                    .to_string(),
            );
        }

        let ttl = self.signing.token_ttl_seconds;
        let max = self.signing.token_ttl_max_seconds;
        if max < MIN_TTL_SECONDS || max > MAX_TTL_SECONDS {
            return Err(format!(
                "TOKEN_TTL_MAX_SECONDS must be between {} and {}",
                MIN_TTL_SECONDS, MAX_TTL_SECONDS
            ));
        }
        if ttl < MIN_TTL_SECONDS || ttl > max {
            return Err(format!(
                "TOKEN_TTL_SECONDS must be between {} and TOKEN_TTL_MAX_SECONDS ({})",
                MIN_TTL_SECONDS, max
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
