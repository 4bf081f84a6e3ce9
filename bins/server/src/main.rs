//! Ledgerbook API Server
//!
//! Main entry point for the Ledgerbook backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerbook_api::{AppState, create_router};
use ledgerbook_db::connect_with;
use ledgerbook_db::migration::{Migrator, MigratorTrait};
use ledgerbook_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (also reads .env)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("Failed to run migrations")?;
        info!("Migrations applied");
    }

    // Identity
    let jwt_service = JwtService::new(&config.jwt);
    if !config.ledger.require_balanced_legs {
        warn!("Unbalanced transactions are accepted; debit and credit totals are not checked");
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        identity: Arc::new(jwt_service),
        ledger: config.ledger,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
