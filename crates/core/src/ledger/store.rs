//! Storage and ownership collaborators consumed by the ledger service.
//!
//! These traits are implemented by the db crate to provide actual database operations.

use std::future::Future;

use moneylog_shared::types::{LogbookId, TransactionId, UserId};

use super::balance::BalanceDelta;
use super::error::{GateError, StoreError};
use super::resource::{Access, ResourcePath};
use super::types::{
    Logbook, LogbookChange, NewLogbook, NewTransaction, Reconciliation, Transaction,
    TransactionChange,
};

/// Durable storage for logbooks and transactions.
///
/// Implementations must keep every logbook's balance equal to the sum of its
/// live transaction amounts once a write returns `Ok`: writes that change a
/// transaction's amount, logbook or liveness apply the deltas from
/// [`plan_deltas`](super::balance::plan_deltas), each under a row lock on the
/// logbook it targets.
pub trait LedgerStore: Send + Sync {
    /// Inserts a logbook with a zero balance.
    fn insert_logbook(
        &self,
        input: NewLogbook,
    ) -> impl Future<Output = Result<Logbook, StoreError>> + Send;

    /// Finds a logbook by ID, deleted or not.
    fn find_logbook(
        &self,
        id: LogbookId,
    ) -> impl Future<Output = Result<Option<Logbook>, StoreError>> + Send;

    /// Lists the live logbooks owned by a user.
    fn list_logbooks(
        &self,
        owner_id: UserId,
    ) -> impl Future<Output = Result<Vec<Logbook>, StoreError>> + Send;

    /// Applies a metadata change to a logbook.
    fn update_logbook(
        &self,
        id: LogbookId,
        change: LogbookChange,
    ) -> impl Future<Output = Result<Logbook, StoreError>> + Send;

    /// Inserts a transaction and credits its logbook, if any.
    fn insert_transaction(
        &self,
        input: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, StoreError>> + Send;

    /// Finds a transaction by ID, deleted or not.
    fn find_transaction(
        &self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, StoreError>> + Send;

    /// Lists the live transactions of a logbook.
    fn list_transactions(
        &self,
        logbook_id: LogbookId,
    ) -> impl Future<Output = Result<Vec<Transaction>, StoreError>> + Send;

    /// Applies a change to a transaction and reconciles affected balances.
    fn update_transaction(
        &self,
        id: TransactionId,
        change: TransactionChange,
    ) -> impl Future<Output = Result<Transaction, StoreError>> + Send;

    /// Adds a delta to one logbook balance under a row lock, in its own unit of work.
    fn apply_balance_delta(
        &self,
        delta: BalanceDelta,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Recomputes a logbook balance from its live transactions and persists it.
    fn reconcile_balance(
        &self,
        id: LogbookId,
    ) -> impl Future<Output = Result<Reconciliation, StoreError>> + Send;
}

/// Decides whether a user may act on a resource, whatever its kind.
pub trait OwnershipGate: Send + Sync {
    /// Resolves ownership of `resource` for `user_id`. Unknown resources are denied.
    fn verify_ownership(
        &self,
        resource: &ResourcePath,
        user_id: UserId,
    ) -> impl Future<Output = Result<Access, GateError>> + Send;
}
