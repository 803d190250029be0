//! Ledger error types.
//!
//! `StoreError` and `GateError` come from the storage and ownership
//! collaborators; `LedgerError` is what mutation handlers report.

use moneylog_shared::AppError;
use moneylog_shared::types::{LogbookId, TransactionId};
use thiserror::Error;

use super::balance::{BalanceDelta, Overflow};

/// Errors raised by a [`LedgerStore`](super::store::LedgerStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Logbook row does not exist.
    #[error("Logbook not found: {0}")]
    LogbookNotFound(LogbookId),

    /// Transaction row does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Logbook is soft-deleted and cannot take new transactions.
    #[error("Logbook {0} is deleted")]
    LogbookDeleted(LogbookId),

    /// Transaction is soft-deleted and can no longer be changed.
    #[error("Transaction {0} is deleted")]
    TransactionDeleted(TransactionId),

    /// Balance arithmetic overflowed; nothing was written.
    #[error(transparent)]
    Overflow(#[from] Overflow),

    /// The entity write committed but a balance delta could not be applied.
    #[error("Transaction {transaction_id} saved but balance of logbook {} not updated by {}: {reason}", .delta.logbook_id, .delta.amount)]
    PartialCommit {
        /// The committed transaction.
        transaction_id: TransactionId,
        /// The delta that was not applied.
        delta: BalanceDelta,
        /// Underlying failure.
        reason: String,
    },

    /// Storage backend failure (unavailable, lock timeout, constraint).
    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Errors raised by an [`OwnershipGate`](super::store::OwnershipGate).
#[derive(Debug, Error)]
pub enum GateError {
    /// The gate could not reach its backing store.
    #[error("Ownership check failed: {0}")]
    Backend(String),
}

/// Client-facing text for backend failures; the detail is only logged.
pub const STORAGE_FAILURE: &str = "ledger storage unavailable";

/// Errors reported by ledger mutation handlers.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller does not own the target resource.
    #[error("Access denied to {0}")]
    Forbidden(String),

    /// Target resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed input; nothing was written.
    #[error("{0}")]
    Validation(String),

    /// Storage failure; nothing was written.
    #[error("{0}")]
    Storage(String),

    /// Entity write committed, balance reconciliation failed.
    #[error("{0}")]
    PartialCommit(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LogbookNotFound(id) => Self::NotFound(format!("Logbook {id}")),
            StoreError::TransactionNotFound(id) => Self::NotFound(format!("Transaction {id}")),
            StoreError::LogbookDeleted(_)
            | StoreError::TransactionDeleted(_)
            | StoreError::Overflow(_) => Self::Validation(err.to_string()),
            StoreError::PartialCommit {
                transaction_id,
                delta,
                ..
            } => Self::PartialCommit(format!(
                "Transaction {transaction_id} saved but balance of logbook {} not updated by {}",
                delta.logbook_id, delta.amount
            )),
            StoreError::Backend(_) => Self::Storage(STORAGE_FAILURE.to_string()),
        }
    }
}

impl From<GateError> for LedgerError {
    fn from(_: GateError) -> Self {
        Self::Storage(STORAGE_FAILURE.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Forbidden(msg) => Self::Forbidden(msg),
            LedgerError::NotFound(msg) => Self::NotFound(msg),
            LedgerError::Validation(msg) => Self::Validation(msg),
            LedgerError::Storage(msg) => Self::Storage(msg),
            LedgerError::PartialCommit(msg) => Self::PartialCommit(msg),
        }
    }
}
