//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise `LOG_LEVEL` applies to this crate
//! and everything else logs at info.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Args, LogFormat};

/// Filter used when `RUST_LOG` is absent
pub fn default_filter(log_level: &str) -> String {
    format!("postern={},info", log_level)
}

/// Install the global subscriber
pub fn init(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&args.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
    }
}
