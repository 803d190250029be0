//! Moneylog API Server
//!
//! Main entry point for the Moneylog ledger service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneylog_api::{AppState, create_router};
use moneylog_core::ledger::{BroadcastEventSink, LedgerSettings};
use moneylog_db::{connect, migration::Migrator};
use moneylog_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moneylog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    if config.database.auto_migrate {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        ..JwtConfig::default()
    });

    info!(
        commit_mode = ?config.ledger.commit_mode,
        occurred_null = ?config.ledger.occurred_null,
        "Ledger configured"
    );
    let state = AppState::new(
        db,
        jwt_service,
        config.ledger.commit_mode,
        LedgerSettings::from(&config.ledger),
        Arc::new(BroadcastEventSink::default()),
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
