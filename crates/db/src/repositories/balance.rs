//! Locked read-modify-write of logbook balances.
//!
//! Every balance change goes through [`LockedLogbooks`]: the logbook rows a
//! unit of work touches are read with `SELECT ... FOR UPDATE` in ascending id
//! order before anything else is written, each delta is added with overflow
//! checking and the new balance is written back against the locked row.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QuerySelect, Set};
use tracing::debug;

use crate::entities::logbooks;
use moneylog_core::ledger::balance::apply_delta;
use moneylog_core::ledger::{BalanceDelta, StoreError};
use moneylog_shared::types::LogbookId;

/// Maps a database error onto the store taxonomy.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn storage(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Reads a logbook row under an exclusive row lock.
pub(crate) async fn lock_logbook<C: ConnectionTrait>(
    conn: &C,
    id: LogbookId,
) -> Result<logbooks::Model, StoreError> {
    logbooks::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(storage)?
        .ok_or(StoreError::LogbookNotFound(id))
}

/// Overwrites a locked logbook's balance.
pub(crate) async fn write_balance<C: ConnectionTrait>(
    conn: &C,
    logbook: logbooks::Model,
    balance: i64,
) -> Result<(), StoreError> {
    let mut active: logbooks::ActiveModel = logbook.into();
    active.balance = Set(balance);
    active.update(conn).await.map_err(storage)?;
    Ok(())
}

/// Logbook rows held under `FOR UPDATE` by one unit of work.
///
/// The locks are released when the caller commits or rolls back. Rows must be
/// locked before the transaction row is inserted or re-pointed: the foreign
/// key check on that write takes a share lock on the logbook, and taking the
/// exclusive lock afterwards deadlocks against a concurrent writer doing the
/// same.
#[derive(Debug, Default)]
pub(crate) struct LockedLogbooks {
    rows: BTreeMap<LogbookId, logbooks::Model>,
}

impl LockedLogbooks {
    /// Locks every distinct logbook in `ids`, lowest id first.
    pub(crate) async fn acquire<C: ConnectionTrait>(
        conn: &C,
        ids: impl IntoIterator<Item = LogbookId>,
    ) -> Result<Self, StoreError> {
        let ids: BTreeSet<LogbookId> = ids.into_iter().collect();
        let mut rows = BTreeMap::new();
        for id in ids {
            rows.insert(id, lock_logbook(conn, id).await?);
        }
        Ok(Self { rows })
    }

    /// Fails unless `id` is locked here and not soft-deleted.
    pub(crate) fn ensure_live(&self, id: LogbookId) -> Result<(), StoreError> {
        match self.rows.get(&id) {
            None => Err(StoreError::LogbookNotFound(id)),
            Some(row) if row.deleted.is_some() => Err(StoreError::LogbookDeleted(id)),
            Some(_) => Ok(()),
        }
    }

    /// Adds `delta` to a locked logbook and returns the new balance.
    pub(crate) async fn apply<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        delta: BalanceDelta,
    ) -> Result<i64, StoreError> {
        let row = self
            .rows
            .get_mut(&delta.logbook_id)
            .ok_or(StoreError::LogbookNotFound(delta.logbook_id))?;
        let balance = apply_delta(row.balance, delta.amount)?;
        write_balance(conn, row.clone(), balance).await?;
        row.balance = balance;
        debug!(logbook_id = %delta.logbook_id, delta = delta.amount, balance, "balance updated");
        Ok(balance)
    }
}

/// Locks one logbook and adds `delta` to its balance.
///
/// Must run inside a database transaction. Returns the new balance.
pub(crate) async fn apply_locked<C: ConnectionTrait>(
    conn: &C,
    delta: BalanceDelta,
) -> Result<i64, StoreError> {
    let mut locked = LockedLogbooks::acquire(conn, [delta.logbook_id]).await?;
    locked.apply(conn, delta).await
}
