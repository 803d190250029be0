//! Ledger repository: logbook and transaction persistence.
//!
//! Implements [`LedgerStore`] on top of SeaORM. Transaction writes lock the
//! transaction row first, then each affected logbook row in ascending ID
//! order, and only then write the transaction row itself. Concurrent writers
//! never wait on each other in a cycle.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::balance::{LockedLogbooks, apply_locked, lock_logbook, storage, write_balance};
use crate::entities::{logbooks, transactions};
use moneylog_core::ledger::balance::apply_delta;
use moneylog_core::ledger::{
    BalanceDelta, LedgerStore, Logbook, LogbookChange, NewLogbook, NewTransaction, Reconciliation,
    StoreError, Transaction, TransactionChange, plan_deltas,
};
use moneylog_shared::CommitMode;
use moneylog_shared::types::{LogbookId, TransactionId, UserId};

/// Ledger repository implementation.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    commit_mode: CommitMode,
}

impl LedgerRepository {
    /// Create a new ledger repository using the atomic commit mode.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_commit_mode(db, CommitMode::default())
    }

    /// Create a new ledger repository with an explicit commit mode.
    #[must_use]
    pub fn with_commit_mode(db: DatabaseConnection, commit_mode: CommitMode) -> Self {
        Self { db, commit_mode }
    }

    /// The configured commit mode.
    #[must_use]
    pub const fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Applies `deltas` and commits `txn` according to the commit mode.
    ///
    /// Atomic: deltas are applied on `txn` against the rows in `locked` and
    /// everything commits together. Two-phase: `txn` commits first, then each
    /// delta runs in its own unit of work; the first failure is reported as a
    /// partial commit.
    async fn settle(
        &self,
        txn: DatabaseTransaction,
        mut locked: LockedLogbooks,
        transaction_id: TransactionId,
        deltas: &[BalanceDelta],
    ) -> Result<(), StoreError> {
        match self.commit_mode {
            CommitMode::Atomic => {
                for delta in deltas {
                    locked.apply(&txn, *delta).await?;
                }
                txn.commit().await.map_err(storage)
            }
            CommitMode::TwoPhase => {
                txn.commit().await.map_err(storage)?;
                for delta in deltas {
                    if let Err(err) = self.apply_balance_delta(*delta).await {
                        return Err(StoreError::PartialCommit {
                            transaction_id,
                            delta: *delta,
                            reason: err.to_string(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

/// Every logbook a write touches: the delta targets plus the assignment target.
fn logbooks_touched(
    deltas: &[BalanceDelta],
    target: Option<LogbookId>,
) -> impl Iterator<Item = LogbookId> + '_ {
    deltas.iter().map(|delta| delta.logbook_id).chain(target)
}

impl LedgerStore for LedgerRepository {
    async fn insert_logbook(&self, input: NewLogbook) -> Result<Logbook, StoreError> {
        let model = logbooks::ActiveModel {
            id: Set(input.id.into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            name: Set(input.name),
            currency: Set(input.currency),
            balance: Set(0),
            created: Set(input.created),
            deleted: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(storage)?;

        Ok(to_logbook(model))
    }

    async fn find_logbook(&self, id: LogbookId) -> Result<Option<Logbook>, StoreError> {
        let model = logbooks::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?;

        Ok(model.map(to_logbook))
    }

    async fn list_logbooks(&self, owner_id: UserId) -> Result<Vec<Logbook>, StoreError> {
        let models = logbooks::Entity::find()
            .filter(logbooks::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(logbooks::Column::Deleted.is_null())
            .order_by_asc(logbooks::Column::Created)
            .order_by_asc(logbooks::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        Ok(models.into_iter().map(to_logbook).collect())
    }

    async fn update_logbook(
        &self,
        id: LogbookId,
        change: LogbookChange,
    ) -> Result<Logbook, StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;
        let model = lock_logbook(&txn, id).await?;
        if model.deleted.is_some() {
            return Err(StoreError::LogbookDeleted(id));
        }

        let mut active: logbooks::ActiveModel = model.into();
        match change {
            LogbookChange::Name(name) => active.name = Set(name),
            LogbookChange::Currency(currency) => active.currency = Set(currency),
            LogbookChange::Delete { at } => active.deleted = Set(Some(at)),
        }
        let model = active.update(&txn).await.map_err(storage)?;
        txn.commit().await.map_err(storage)?;

        Ok(to_logbook(model))
    }

    async fn insert_transaction(&self, input: NewTransaction) -> Result<Transaction, StoreError> {
        let transaction = input.into_transaction();
        let deltas = plan_deltas(None, Some(&transaction))?;

        let txn = self.db.begin().await.map_err(storage)?;
        let locked =
            LockedLogbooks::acquire(&txn, logbooks_touched(&deltas, transaction.logbook_id))
                .await?;
        if let Some(logbook_id) = transaction.logbook_id {
            locked.ensure_live(logbook_id)?;
        }
        transactions::ActiveModel {
            id: Set(transaction.id.into_inner()),
            owner_id: Set(transaction.owner_id.into_inner()),
            logbook_id: Set(transaction.logbook_id.map(LogbookId::into_inner)),
            summary: Set(transaction.summary.clone()),
            amount: Set(transaction.amount),
            occurred: Set(transaction.occurred),
            deleted: Set(None),
            created: Set(transaction.created),
        }
        .insert(&txn)
        .await
        .map_err(storage)?;

        self.settle(txn, locked, transaction.id, &deltas).await?;
        Ok(transaction)
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?;

        Ok(model.map(to_transaction))
    }

    async fn list_transactions(&self, logbook_id: LogbookId) -> Result<Vec<Transaction>, StoreError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::LogbookId.eq(logbook_id.into_inner()))
            .filter(transactions::Column::Deleted.is_null())
            .order_by_asc(transactions::Column::Created)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        Ok(models.into_iter().map(to_transaction).collect())
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        change: TransactionChange,
    ) -> Result<Transaction, StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;

        // The committed row, locked so a concurrent writer cannot reuse a stale amount
        let model = transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(storage)?
            .ok_or(StoreError::TransactionNotFound(id))?;
        let before = to_transaction(model.clone());
        if !before.is_live() {
            return Err(StoreError::TransactionDeleted(id));
        }

        let after = before.with_change(&change);
        let deltas = plan_deltas(Some(&before), Some(&after))?;
        let target = match &change {
            TransactionChange::Logbook(target) => *target,
            _ => None,
        };
        let locked = LockedLogbooks::acquire(&txn, logbooks_touched(&deltas, target)).await?;
        if let Some(target) = target {
            locked.ensure_live(target)?;
        }

        let mut active: transactions::ActiveModel = model.into();
        match change {
            TransactionChange::Amount(amount) => active.amount = Set(amount),
            TransactionChange::Summary(summary) => active.summary = Set(summary),
            TransactionChange::Occurred(occurred) => active.occurred = Set(occurred),
            TransactionChange::Logbook(logbook_id) => {
                active.logbook_id = Set(logbook_id.map(LogbookId::into_inner));
            }
            TransactionChange::Delete { at } => active.deleted = Set(Some(at)),
        }
        active.update(&txn).await.map_err(storage)?;

        self.settle(txn, locked, id, &deltas).await?;
        Ok(after)
    }

    async fn apply_balance_delta(&self, delta: BalanceDelta) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;
        apply_locked(&txn, delta).await?;
        txn.commit().await.map_err(storage)
    }

    async fn reconcile_balance(&self, id: LogbookId) -> Result<Reconciliation, StoreError> {
        let txn = self.db.begin().await.map_err(storage)?;
        let logbook = lock_logbook(&txn, id).await?;

        // Summed here rather than in SQL so the result stays an exact i64 on every backend
        let amounts: Vec<i64> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Amount)
            .filter(transactions::Column::LogbookId.eq(id.into_inner()))
            .filter(transactions::Column::Deleted.is_null())
            .into_tuple::<i64>()
            .all(&txn)
            .await
            .map_err(storage)?;
        let balance = amounts.into_iter().try_fold(0i64, apply_delta)?;

        let previous_balance = logbook.balance;
        if previous_balance != balance {
            write_balance(&txn, logbook, balance).await?;
        }
        txn.commit().await.map_err(storage)?;

        info!(logbook_id = %id, previous_balance, balance, "logbook reconciled");
        Ok(Reconciliation {
            logbook_id: id,
            previous_balance,
            balance,
        })
    }
}

fn to_logbook(model: logbooks::Model) -> Logbook {
    Logbook {
        id: LogbookId::from_uuid(model.id),
        owner_id: UserId::from_uuid(model.owner_id),
        name: model.name,
        currency: model.currency,
        balance: model.balance,
        created: model.created,
        deleted: model.deleted,
    }
}

fn to_transaction(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        owner_id: UserId::from_uuid(model.owner_id),
        logbook_id: model.logbook_id.map(LogbookId::from_uuid),
        summary: model.summary,
        amount: model.amount,
        occurred: model.occurred,
        deleted: model.deleted,
        created: model.created,
    }
}
