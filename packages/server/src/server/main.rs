// Main entry point for the election data server

use std::sync::Arc;

use anyhow::{Context, Result};
use scrutin_core::server::build_app;
use scrutin_core::server::middleware::AuthVerifier;
use scrutin_core::{domains::territory, kernel::ServerDeps, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scrutin_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting election data server");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // The territorial reference data is immutable at runtime; load it once
    let index = territory::data::load_index(&pool)
        .await
        .context("Failed to load the territorial index")?;
    tracing::info!("Territorial index loaded ({} nodes)", index.len());

    let verifier = Arc::new(AuthVerifier::new(&config.jwt_secret, config.jwt_issuer));
    let deps = ServerDeps::postgres(pool, index, &config.document_dir);
    let app = build_app(deps, verifier);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
