use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use linklet::api;
use linklet::auth::SessionVerifier;
use linklet::config::{AuthMode, Config, DatabaseBackend};
use linklet::redirect::{self, RedirectResolver};
use linklet::service::ShortenerService;
use linklet::storage::{CachedLinkStore, LinkStore, PostgresLinkStore, SqliteLinkStore};
use linklet::tracker::ClickTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    if config.demo {
        tracing::warn!(
            "Demo configuration active: in-memory database, authentication disabled. \
             Set DATABASE_URL and AUTH_MODE to run against real services."
        );
    }

    // Initialize storage
    let backing: Arc<dyn LinkStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteLinkStore::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresLinkStore::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    info!("Initializing database...");
    backing.init().await?;
    info!("Database initialized successfully");

    // Redirect lookups go through a bounded read cache
    let store: Arc<dyn LinkStore> = Arc::new(CachedLinkStore::new(
        backing,
        config.cache.max_entries,
        config.cache.ttl_secs,
    ));

    // Initialize session verification
    let verifier = Arc::new(SessionVerifier::new(&config.auth).await?);
    match config.auth.mode {
        AuthMode::None => {
            info!("🔓 Authentication is disabled - API callers share a local demo identity");
        }
        AuthMode::Jwt => {
            if let Some(jwt) = config.auth.jwt.as_ref() {
                info!(
                    "🔐 Session verification enabled (issuer: {}, audience: {})",
                    jwt.issuer_url, jwt.audience
                );
            }
        }
    }

    let service = ShortenerService::new(Arc::clone(&store), config.base_url.clone());
    let tracker = Arc::new(ClickTracker::new(Arc::clone(&store)));
    let resolver = RedirectResolver::new(Arc::clone(&store), tracker);

    // Create routers
    let api_router = api::create_api_router(Arc::clone(&store), service, verifier);
    let redirect_router = redirect::create_redirect_router(resolver);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Endpoints available at http://{}/api/...", api_addr);

    // Start redirect server
    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("🚀 Redirect server listening on http://{}", redirect_addr);
    info!("   - Short links resolve under {}", config.base_url);

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(redirect_listener, redirect_router),
    )?;

    Ok(())
}
