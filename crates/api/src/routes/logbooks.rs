//! Logbook routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UpdateRequest;
use super::transactions::TransactionResponse;
use crate::error::{ApiResult, parse_id};
use crate::{AppState, middleware::AuthUser};
use moneylog_core::ledger::{CreateLogbookInput, Logbook, Reconciliation};
use moneylog_shared::types::LogbookId;

/// Creates the logbook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logbooks", post(create_logbook))
        .route("/logbooks/all", get(list_logbooks))
        .route("/logbook/{id}", get(get_logbook).delete(delete_logbook))
        .route("/logbook/{id}/name", put(rename_logbook))
        .route("/logbook/{id}/currency", put(change_currency))
        .route("/logbook/{id}/transactions", get(list_transactions))
        .route("/logbook/{id}/reconcile", post(reconcile_logbook))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a logbook.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateLogbookRequest {
    /// Display name.
    pub name: Option<String>,
    /// Three-letter currency code.
    pub currency: Option<String>,
}

/// A logbook as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogbookResponse {
    /// Logbook ID.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Display name.
    pub name: String,
    /// Currency code.
    pub currency: String,
    /// Sum of live transaction amounts.
    pub balance: i64,
    /// Creation time (epoch seconds).
    pub created: i64,
    /// Soft-delete time (epoch seconds).
    pub deleted: Option<i64>,
}

impl From<Logbook> for LogbookResponse {
    fn from(logbook: Logbook) -> Self {
        Self {
            id: logbook.id.into_inner(),
            owner_id: logbook.owner_id.into_inner(),
            name: logbook.name,
            currency: logbook.currency,
            balance: logbook.balance,
            created: logbook.created,
            deleted: logbook.deleted,
        }
    }
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReconcileResponse {
    /// Logbook ID.
    pub logbook_id: Uuid,
    /// Balance before the pass.
    pub previous_balance: i64,
    /// Recomputed balance.
    pub balance: i64,
}

impl From<Reconciliation> for ReconcileResponse {
    fn from(outcome: Reconciliation) -> Self {
        Self {
            logbook_id: outcome.logbook_id.into_inner(),
            previous_balance: outcome.previous_balance,
            balance: outcome.balance,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/logbooks` - Create a logbook.
async fn create_logbook(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateLogbookRequest>, JsonRejection>,
) -> ApiResult<Json<LogbookResponse>> {
    let Json(payload) = payload?;
    let logbook = state
        .ledger
        .create_logbook(
            auth.user_id(),
            CreateLogbookInput {
                name: payload.name,
                currency: payload.currency,
            },
        )
        .await?;
    Ok(Json(logbook.into()))
}

/// GET `/logbooks/all` - List the caller's live logbooks.
async fn list_logbooks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<LogbookResponse>>> {
    let logbooks = state.ledger.list_logbooks(auth.user_id()).await?;
    Ok(Json(logbooks.into_iter().map(Into::into).collect()))
}

/// GET `/logbook/{id}` - Fetch a logbook.
async fn get_logbook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<LogbookResponse>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let logbook = state.ledger.fetch_logbook(auth.user_id(), id).await?;
    Ok(Json(logbook.into()))
}

/// PUT `/logbook/{id}/name` - Rename a logbook.
async fn rename_logbook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<LogbookResponse>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let Json(payload) = payload?;
    let logbook = state
        .ledger
        .rename_logbook(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(logbook.into()))
}

/// PUT `/logbook/{id}/currency` - Change a logbook's currency code.
async fn change_currency(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<LogbookResponse>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let Json(payload) = payload?;
    let logbook = state
        .ledger
        .change_logbook_currency(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(logbook.into()))
}

/// DELETE `/logbook/{id}` - Soft-delete a logbook.
async fn delete_logbook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<LogbookResponse>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let logbook = state.ledger.delete_logbook(auth.user_id(), id).await?;
    Ok(Json(logbook.into()))
}

/// GET `/logbook/{id}/transactions` - Live transactions of a logbook.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let transactions = state.ledger.list_transactions(auth.user_id(), id).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// POST `/logbook/{id}/reconcile` - Recompute the balance from live transactions.
async fn reconcile_logbook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ReconcileResponse>> {
    let id: LogbookId = parse_id(&id, "logbook")?;
    let outcome = state.ledger.reconcile_logbook(auth.user_id(), id).await?;
    Ok(Json(outcome.into()))
}
