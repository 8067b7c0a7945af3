use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use sqlx::migrate::Migrator;
use tracing_subscriber::prelude::*;

use pulsepay_core::adapters::PostgresWalletStore;
use pulsepay_core::{config, create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Wallet store
    let store = PostgresWalletStore::connect(&config.database_url).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(store.pool()).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(Arc::new(store));
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
