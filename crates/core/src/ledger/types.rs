//! Domain types for logbooks and their transactions.

use moneylog_shared::types::{LogbookId, TransactionId, UserId};
use serde::{Deserialize, Serialize};

/// A user-owned account whose balance is the sum of its live transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logbook {
    /// Logbook ID.
    pub id: LogbookId,
    /// Owning user.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Three-letter currency code, lower-cased.
    pub currency: String,
    /// Cached aggregate of live transaction amounts, in minor units.
    pub balance: i64,
    /// Creation time (epoch seconds).
    pub created: i64,
    /// Soft-delete time (epoch seconds).
    pub deleted: Option<i64>,
}

impl Logbook {
    /// Returns true unless the logbook has been soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted.is_none()
    }
}

/// A dated monetary entry, optionally assigned to a logbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Creating user.
    pub owner_id: UserId,
    /// Owning logbook; `None` means unassigned.
    pub logbook_id: Option<LogbookId>,
    /// Free-text label.
    pub summary: String,
    /// Signed amount in minor units.
    pub amount: i64,
    /// When the transaction took effect (epoch seconds).
    pub occurred: Option<i64>,
    /// Soft-delete time (epoch seconds).
    pub deleted: Option<i64>,
    /// When the record was written (epoch seconds).
    pub created: i64,
}

impl Transaction {
    /// Returns true unless the transaction has been soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted.is_none()
    }

    /// Returns the transaction as it looks after `change`.
    #[must_use]
    pub fn with_change(&self, change: &TransactionChange) -> Self {
        let mut next = self.clone();
        match change {
            TransactionChange::Amount(amount) => next.amount = *amount,
            TransactionChange::Summary(summary) => next.summary.clone_from(summary),
            TransactionChange::Occurred(occurred) => next.occurred = *occurred,
            TransactionChange::Logbook(logbook_id) => next.logbook_id = *logbook_id,
            TransactionChange::Delete { at } => next.deleted = Some(*at),
        }
        next
    }
}

/// Input for inserting a logbook.
#[derive(Debug, Clone)]
pub struct NewLogbook {
    /// Pre-assigned ID.
    pub id: LogbookId,
    /// Owning user.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized currency code.
    pub currency: String,
    /// Creation time (epoch seconds).
    pub created: i64,
}

/// A single-field change to a logbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogbookChange {
    /// Rename.
    Name(String),
    /// Switch the display currency.
    Currency(String),
    /// Soft-delete at the given time.
    Delete {
        /// Epoch seconds.
        at: i64,
    },
}

/// Input for inserting a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Pre-assigned ID.
    pub id: TransactionId,
    /// Creating user.
    pub owner_id: UserId,
    /// Logbook to assign to, if any.
    pub logbook_id: Option<LogbookId>,
    /// Free-text label.
    pub summary: String,
    /// Signed amount in minor units.
    pub amount: i64,
    /// When the transaction took effect.
    pub occurred: Option<i64>,
    /// Creation time (epoch seconds).
    pub created: i64,
}

impl NewTransaction {
    /// The record this input produces once inserted.
    #[must_use]
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id,
            owner_id: self.owner_id,
            logbook_id: self.logbook_id,
            summary: self.summary,
            amount: self.amount,
            occurred: self.occurred,
            deleted: None,
            created: self.created,
        }
    }
}

/// A single-field change to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionChange {
    /// Amend the amount.
    Amount(i64),
    /// Replace the summary.
    Summary(String),
    /// Set or clear the occurred timestamp.
    Occurred(Option<i64>),
    /// Re-assign to another logbook, or unassign.
    Logbook(Option<LogbookId>),
    /// Soft-delete at the given time.
    Delete {
        /// Epoch seconds.
        at: i64,
    },
}

/// Outcome of recomputing a logbook balance from its live transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// The logbook that was reconciled.
    pub logbook_id: LogbookId,
    /// Cached balance before the pass.
    pub previous_balance: i64,
    /// Recomputed balance, now persisted.
    pub balance: i64,
}

impl Reconciliation {
    /// Amount the cached balance had drifted by.
    #[must_use]
    pub const fn drift(&self) -> i64 {
        self.previous_balance.wrapping_sub(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            id: TransactionId::new(),
            owner_id: UserId::new(),
            logbook_id: Some(LogbookId::new()),
            summary: "Coffee".to_string(),
            amount: -450,
            occurred: Some(1_700_000_000),
            deleted: None,
            created: 1_700_000_000,
        }
    }

    #[test]
    fn test_with_change_touches_only_the_named_field() {
        let tx = sample();

        let amended = tx.with_change(&TransactionChange::Amount(100));
        assert_eq!(amended.amount, 100);
        assert_eq!(amended.summary, tx.summary);

        let cleared = tx.with_change(&TransactionChange::Occurred(None));
        assert_eq!(cleared.occurred, None);
        assert_eq!(cleared.amount, tx.amount);

        let unassigned = tx.with_change(&TransactionChange::Logbook(None));
        assert_eq!(unassigned.logbook_id, None);
    }

    #[test]
    fn test_delete_marks_not_live() {
        let tx = sample();
        assert!(tx.is_live());
        assert!(!tx.with_change(&TransactionChange::Delete { at: 5 }).is_live());
    }

    #[test]
    fn test_reconciliation_drift() {
        let r = Reconciliation {
            logbook_id: LogbookId::new(),
            previous_balance: 150,
            balance: 100,
        };
        assert_eq!(r.drift(), 50);
    }
}
