//! Postern - private media gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use postern::{
    auth::{IdentityResolver, JwtIdentityResolver},
    config::Args,
    db::MongoObjectLocator,
    logging,
    proxy::StorageProxy,
    server::{self, AppState},
    services::MediaAccessService,
    signing::TokenSigner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Postern - private media gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} ({}.{})", args.mongodb_uri, args.mongodb_db, args.media_collection);
    info!("Allowed origins: {}", args.origin_policy().len());
    info!("======================================");

    let identity: Arc<dyn IdentityResolver> = match args.identity.identity_jwt_secret.as_deref() {
        Some(secret) => Arc::new(JwtIdentityResolver::new(
            secret,
            args.identity.identity_issuer.as_deref(),
            &args.identity.session_cookie,
        )?),
        None => {
            warn!("IDENTITY_JWT_SECRET not set, using development secret");
            Arc::new(JwtIdentityResolver::new_dev(&args.identity.session_cookie))
        }
    };

    // Connected on first lookup, closed on shutdown
    let locator = Arc::new(MongoObjectLocator::new(
        &args.mongodb_uri,
        &args.mongodb_db,
        &args.media_collection,
    ));

    let signer = TokenSigner::new(
        args.signing_secret(),
        args.signing.cdn_base_url.as_deref().unwrap_or_default(),
        args.signing.token_ttl_max_seconds,
    );
    if signer.is_available() {
        info!("Signed CDN redirects enabled (max TTL {}s)", signer.max_ttl());
    } else {
        warn!("SIGNING_SECRET not set, all media will be proxied");
    }

    let store = match args.storage_credentials() {
        Some((zone, key)) => {
            let proxy = StorageProxy::new(
                &args.storage.storage_host,
                zone,
                key,
                args.request_timeout(),
            )?;
            info!("Storage proxy: {}", proxy.base_url());
            Some(proxy)
        }
        None => {
            info!("Storage proxy not configured");
            None
        }
    };

    let access = MediaAccessService::new(
        identity,
        locator.clone(),
        signer,
        store,
        args.signing.token_ttl_seconds,
    );
    let state = Arc::new(AppState::new(args, access));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let result = server::run(state, shutdown).await;
    locator.close().await;
    result?;

    info!("Postern stopped");
    Ok(())
}
