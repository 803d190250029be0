//! API route definitions.

use axum::{Router, middleware};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppState, middleware::auth_middleware};

pub mod health;
pub mod logbooks;
pub mod transactions;

/// Body of single-field update requests.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// The replacement value; its shape is checked by the ledger service.
    #[serde(rename = "newValue")]
    pub new_value: Value,
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(logbooks::routes())
        .merge(transactions::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
