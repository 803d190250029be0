//! Liveness and database reachability.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// `up` or `down`.
    pub database: &'static str,
    /// Commit protocol for balance updates.
    pub commit_mode: &'static str,
}

/// GET `/health` - Pings the database; 503 when it does not answer.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database ping failed");
            false
        }
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if reachable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if reachable { "up" } else { "down" },
        commit_mode: state.commit_mode.as_str(),
    };
    (status, Json(body))
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
