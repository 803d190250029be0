//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::UpdateRequest;
use crate::error::{ApiResult, parse_id};
use crate::{AppState, middleware::AuthUser};
use moneylog_core::ledger::{CreateTransactionInput, Transaction};
use moneylog_shared::types::{LogbookId, TransactionId};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transaction/{id}", get(get_transaction).delete(delete_transaction))
        .route("/transaction/{id}/amount", put(change_amount))
        .route("/transaction/{id}/summary", put(change_summary))
        .route("/transaction/{id}/occurred", put(change_occurred))
        .route("/transaction/{id}/logbook", put(move_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a transaction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTransactionRequest {
    /// Logbook to credit.
    pub logbook_id: Option<LogbookId>,
    /// Free-text label.
    pub summary: Option<String>,
    /// Amount in minor units.
    pub amount: Option<Value>,
    /// Epoch seconds; anything else means now.
    pub occurred: Option<Value>,
}

/// A transaction as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Creating user.
    pub owner_id: Uuid,
    /// Owning logbook.
    pub logbook_id: Option<Uuid>,
    /// Free-text label.
    pub summary: String,
    /// Signed amount in minor units.
    pub amount: i64,
    /// When the transaction took effect.
    pub occurred: Option<i64>,
    /// Soft-delete time.
    pub deleted: Option<i64>,
    /// Creation time.
    pub created: i64,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id.into_inner(),
            owner_id: tx.owner_id.into_inner(),
            logbook_id: tx.logbook_id.map(LogbookId::into_inner),
            summary: tx.summary,
            amount: tx.amount,
            occurred: tx.occurred,
            deleted: tx.deleted,
            created: tx.created,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/transactions` - Create a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let Json(payload) = payload?;
    let tx = state
        .ledger
        .create_transaction(
            auth.user_id(),
            CreateTransactionInput {
                logbook_id: payload.logbook_id,
                summary: payload.summary,
                amount: payload.amount,
                occurred: payload.occurred,
            },
        )
        .await?;
    Ok(Json(tx.into()))
}

/// GET `/transaction/{id}` - Fetch a transaction, deleted ones included.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let tx = state.ledger.fetch_transaction(auth.user_id(), id).await?;
    Ok(Json(tx.into()))
}

/// PUT `/transaction/{id}/amount` - Amend the amount.
async fn change_amount(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let Json(payload) = payload?;
    let tx = state
        .ledger
        .change_transaction_amount(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(tx.into()))
}

/// PUT `/transaction/{id}/summary` - Replace the summary.
async fn change_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let Json(payload) = payload?;
    let tx = state
        .ledger
        .change_transaction_summary(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(tx.into()))
}

/// PUT `/transaction/{id}/occurred` - Set `Occurred` to "now", a timestamp, or null.
async fn change_occurred(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let Json(payload) = payload?;
    let tx = state
        .ledger
        .change_transaction_occurred(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(tx.into()))
}

/// PUT `/transaction/{id}/logbook` - Re-assign or unassign.
async fn move_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let Json(payload) = payload?;
    let tx = state
        .ledger
        .move_transaction(auth.user_id(), id, &payload.new_value)
        .await?;
    Ok(Json(tx.into()))
}

/// DELETE `/transaction/{id}` - Soft-delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionResponse>> {
    let id: TransactionId = parse_id(&id, "transaction")?;
    let tx = state.ledger.delete_transaction(auth.user_id(), id).await?;
    Ok(Json(tx.into()))
}
