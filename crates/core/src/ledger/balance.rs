//! Balance delta algebra.
//!
//! A transaction contributes its amount to exactly one logbook while it is
//! live and assigned. Every mutation is reduced to the difference between the
//! contribution after and the contribution before, so creates, amendments,
//! soft-deletes and re-assignments all go through one code path.

use moneylog_shared::types::LogbookId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::Transaction;

/// Balance arithmetic left the `i64` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("balance arithmetic overflowed")]
pub struct Overflow;

/// A signed change to one logbook's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Logbook whose balance changes.
    pub logbook_id: LogbookId,
    /// Amount to add (may be negative).
    pub amount: i64,
}

impl BalanceDelta {
    /// Creates a delta.
    #[must_use]
    pub const fn new(logbook_id: LogbookId, amount: i64) -> Self {
        Self { logbook_id, amount }
    }

    /// The delta that undoes this one.
    pub fn negate(self) -> Result<Self, Overflow> {
        let amount = self.amount.checked_neg().ok_or(Overflow)?;
        Ok(Self::new(self.logbook_id, amount))
    }
}

/// What a transaction currently adds to a logbook balance, if anything.
#[must_use]
pub fn contribution(transaction: &Transaction) -> Option<BalanceDelta> {
    if !transaction.is_live() {
        return None;
    }
    transaction
        .logbook_id
        .map(|logbook_id| BalanceDelta::new(logbook_id, transaction.amount))
}

/// Delta for amending an amount within the same logbook.
pub fn amendment_delta(old: i64, new: i64) -> Result<i64, Overflow> {
    new.checked_sub(old).ok_or(Overflow)
}

/// Adds `delta` to `balance`.
pub fn apply_delta(balance: i64, delta: i64) -> Result<i64, Overflow> {
    balance.checked_add(delta).ok_or(Overflow)
}

/// Deltas needed to move from `before` to `after`.
///
/// `None` on either side means the record does not exist on that side
/// (a create has no `before`). Zero deltas are dropped and the result is
/// sorted by logbook ID, which is the order row locks must be taken in.
pub fn plan_deltas(
    before: Option<&Transaction>,
    after: Option<&Transaction>,
) -> Result<Vec<BalanceDelta>, Overflow> {
    let mut deltas = match (before.and_then(contribution), after.and_then(contribution)) {
        (None, None) => Vec::new(),
        (None, Some(added)) => vec![added],
        (Some(removed), None) => vec![removed.negate()?],
        (Some(old), Some(new)) if old.logbook_id == new.logbook_id => vec![BalanceDelta::new(
            new.logbook_id,
            amendment_delta(old.amount, new.amount)?,
        )],
        (Some(old), Some(new)) => vec![old.negate()?, new],
    };

    deltas.retain(|delta| delta.amount != 0);
    deltas.sort_by_key(|delta| delta.logbook_id);
    Ok(deltas)
}

/// Sum of amounts over the live transactions assigned to `logbook_id`.
pub fn live_total<'a, I>(logbook_id: LogbookId, transactions: I) -> Result<i64, Overflow>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter_map(contribution)
        .filter(|c| c.logbook_id == logbook_id)
        .try_fold(0i64, |total, c| apply_delta(total, c.amount))
}
