//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for logbooks and transactions
//! - Bearer token authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use moneylog_core::ledger::{BroadcastEventSink, LedgerService, LedgerSettings};
use moneylog_db::{LedgerRepository, OwnershipRepository};
use moneylog_shared::{CommitMode, JwtService};

/// The ledger service as wired for HTTP handlers.
pub type Ledger = LedgerService<LedgerRepository, OwnershipRepository, BroadcastEventSink>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger mutation handlers.
    pub ledger: Ledger,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Connection pool, for health checks.
    pub db: DatabaseConnection,
    /// Commit protocol the ledger runs with.
    pub commit_mode: CommitMode,
}

impl AppState {
    /// Wires the ledger service against a database connection.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        commit_mode: CommitMode,
        settings: LedgerSettings,
        events: Arc<BroadcastEventSink>,
    ) -> Self {
        let store = LedgerRepository::with_commit_mode(db.clone(), commit_mode);
        let gate = OwnershipRepository::new(db.clone());
        Self {
            ledger: LedgerService::new(Arc::new(store), Arc::new(gate), events, settings),
            jwt_service: Arc::new(jwt_service),
            db,
            commit_mode,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
