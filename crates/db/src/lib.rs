//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository implementations of the ledger store and ownership gate
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{LedgerRepository, OwnershipRepository};

use moneylog_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Establishes a connection pool to the configured database.
///
/// SQLite has no row locks, so a SQLite URL always gets a single-connection
/// pool: one writer at a time, whatever `max_connections` says. Use
/// PostgreSQL for concurrent writers.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let (max_connections, min_connections) = pool_size(config);
    if max_connections < config.max_connections {
        info!(
            configured = config.max_connections,
            "SQLite database, running with a single connection"
        );
    }

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}

fn pool_size(config: &DatabaseConfig) -> (u32, u32) {
    if config.url.starts_with("sqlite:") {
        (1, 1)
    } else {
        (config.max_connections, config.min_connections)
    }
}
