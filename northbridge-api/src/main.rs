//! # NorthBridge API Server
//!
//! Multi-tenant marketplace backend: admins, shoppers and vendors sign in
//! with an `access_token` cookie; vendors run stores and list products;
//! shoppers keep carts, place orders and pay through Paystack.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/northbridge \
//! JWT_SECRET=... UPLOADS_DIR=./uploads \
//! cargo run -p northbridge-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON logs and `RUST_LOG` to change the filter.

use anyhow::Context;
use northbridge_api::{
    app::{build_router, AppState},
    config::Config,
};
use northbridge_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, PoolConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("NorthBridge API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        app = %config.app.name,
        version = %config.app.version,
        environment = ?config.app.environment,
        "Configuration loaded"
    );

    let pool = create_pool(
        PoolConfig::from_url(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool).await.context("Failed to run migrations")?;
    tracing::info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.uploads.dir.display()))?;

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config).context("Failed to build payment client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "northbridge_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
