//! Ledger mutation handlers.
//!
//! Every mutation runs the same sequence: ownership check on the target path,
//! input validation, then a single store call that writes the entity and
//! applies its balance deltas. Creations are announced on the event sink.

use std::sync::Arc;

use moneylog_shared::types::{LogbookId, TransactionId, UserId};
use moneylog_shared::{LedgerConfig, OccurredNullPolicy};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::{LedgerError, StoreError};
use super::events::{EventSink, ResourceEvent};
use super::occurred::{OccurredUpdate, occurred_on_create};
use super::resource::ResourcePath;
use super::store::{LedgerStore, OwnershipGate};
use super::types::{
    Logbook, LogbookChange, NewLogbook, NewTransaction, Reconciliation, Transaction,
    TransactionChange,
};
use super::validation::{
    DEFAULT_LOGBOOK_NAME, DEFAULT_TRANSACTION_SUMMARY, name_or_default, normalize_currency,
    normalize_name, parse_amount,
};

/// Input for creating a logbook.
#[derive(Debug, Clone, Default)]
pub struct CreateLogbookInput {
    /// Display name; blank means the default.
    pub name: Option<String>,
    /// Currency code; missing means the configured default.
    pub currency: Option<String>,
}

/// Input for creating a transaction.
#[derive(Debug, Clone, Default)]
pub struct CreateTransactionInput {
    /// Logbook to credit, if any.
    pub logbook_id: Option<LogbookId>,
    /// Free-text label; blank means the default.
    pub summary: Option<String>,
    /// Amount in minor units; missing means zero.
    pub amount: Option<Value>,
    /// Raw `Occurred`; anything but an integer means now.
    pub occurred: Option<Value>,
}

/// Service-level knobs taken from [`LedgerConfig`].
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// How `null` is treated on `Occurred` updates.
    pub occurred_null: OccurredNullPolicy,
    /// Currency for logbooks created without one.
    pub default_currency: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            occurred_null: config.occurred_null,
            default_currency: config.default_currency.clone(),
        }
    }
}

/// Mutation handlers for logbooks and transactions.
pub struct LedgerService<S, G, E> {
    store: Arc<S>,
    gate: Arc<G>,
    events: Arc<E>,
    settings: LedgerSettings,
}

impl<S, G, E> Clone for LedgerService<S, G, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            events: Arc::clone(&self.events),
            settings: self.settings.clone(),
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn expect_string<'a>(value: &'a Value, field: &str) -> Result<&'a str, LedgerError> {
    value
        .as_str()
        .ok_or_else(|| LedgerError::Validation(format!("{field} must be a string, got {value}")))
}

impl<S, G, E> LedgerService<S, G, E>
where
    S: LedgerStore,
    G: OwnershipGate,
    E: EventSink,
{
    /// Create a new ledger service.
    #[must_use]
    pub fn new(store: Arc<S>, gate: Arc<G>, events: Arc<E>, settings: LedgerSettings) -> Self {
        Self {
            store,
            gate,
            events,
            settings,
        }
    }

    /// Fails with [`LedgerError::Forbidden`] unless `user_id` owns `resource`.
    async fn authorize(&self, resource: ResourcePath, user_id: UserId) -> Result<(), LedgerError> {
        let access = self
            .gate
            .verify_ownership(&resource, user_id)
            .await
            .map_err(|err| {
                error!(resource = %resource, error = %err, "ownership check failed");
                LedgerError::from(err)
            })?;
        if access.is_allowed() {
            Ok(())
        } else {
            warn!(resource = %resource, user_id = %user_id, "ownership check denied");
            Err(LedgerError::Forbidden(resource.to_string()))
        }
    }

    fn report(err: StoreError) -> LedgerError {
        match &err {
            StoreError::PartialCommit {
                transaction_id,
                delta,
                reason,
            } => {
                error!(
                    transaction_id = %transaction_id,
                    logbook_id = %delta.logbook_id,
                    delta = delta.amount,
                    reason = %reason,
                    "balance not reconciled after transaction write"
                );
            }
            StoreError::Backend(reason) => error!(reason = %reason, "ledger storage failure"),
            _ => {}
        }
        LedgerError::from(err)
    }

    // ------------------------------------------------------------------
    // Logbooks
    // ------------------------------------------------------------------

    /// Creates an empty logbook owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed currency code and `Storage` if the
    /// insert fails.
    pub async fn create_logbook(
        &self,
        user_id: UserId,
        input: CreateLogbookInput,
    ) -> Result<Logbook, LedgerError> {
        let currency = normalize_currency(
            input
                .currency
                .as_deref()
                .unwrap_or(&self.settings.default_currency),
        )?;
        let new = NewLogbook {
            id: LogbookId::new(),
            owner_id: user_id,
            name: name_or_default(input.name.as_deref(), DEFAULT_LOGBOOK_NAME),
            currency,
            created: now(),
        };

        let logbook = self.store.insert_logbook(new).await.map_err(Self::report)?;
        info!(logbook_id = %logbook.id, owner_id = %user_id, "logbook created");
        self.events.emit(ResourceEvent::Created {
            resource: ResourcePath::Logbook(logbook.id),
            owner: user_id,
        });
        Ok(logbook)
    }

    /// Lists the caller's live logbooks.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the read fails.
    pub async fn list_logbooks(&self, user_id: UserId) -> Result<Vec<Logbook>, LedgerError> {
        self.store.list_logbooks(user_id).await.map_err(Self::report)
    }

    /// Fetches a logbook, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs and `Forbidden` for foreign logbooks.
    pub async fn fetch_logbook(&self, user_id: UserId, id: LogbookId) -> Result<Logbook, LedgerError> {
        let logbook = self
            .store
            .find_logbook(id)
            .await
            .map_err(Self::report)?
            .ok_or_else(|| LedgerError::NotFound(format!("Logbook {id}")))?;
        self.authorize(ResourcePath::Logbook(id), user_id).await?;
        Ok(logbook)
    }

    /// Renames a logbook.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` unless `value` is a non-blank string.
    pub async fn rename_logbook(
        &self,
        user_id: UserId,
        id: LogbookId,
        value: &Value,
    ) -> Result<Logbook, LedgerError> {
        self.authorize(ResourcePath::Logbook(id), user_id).await?;
        let name = normalize_name(expect_string(value, "Name")?, "Name")?;
        self.store
            .update_logbook(id, LogbookChange::Name(name))
            .await
            .map_err(Self::report)
    }

    /// Changes a logbook's currency code. Balances are not converted.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` for a malformed code.
    pub async fn change_logbook_currency(
        &self,
        user_id: UserId,
        id: LogbookId,
        value: &Value,
    ) -> Result<Logbook, LedgerError> {
        self.authorize(ResourcePath::Logbook(id), user_id).await?;
        let currency = normalize_currency(expect_string(value, "Currency")?)?;
        self.store
            .update_logbook(id, LogbookChange::Currency(currency))
            .await
            .map_err(Self::report)
    }

    /// Soft-deletes a logbook. Its transactions keep their assignment.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` if the logbook is already deleted.
    pub async fn delete_logbook(&self, user_id: UserId, id: LogbookId) -> Result<Logbook, LedgerError> {
        self.authorize(ResourcePath::Logbook(id), user_id).await?;
        self.store
            .update_logbook(id, LogbookChange::Delete { at: now() })
            .await
            .map_err(Self::report)
    }

    /// Lists the live transactions of a logbook.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the caller owns the logbook.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        logbook_id: LogbookId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.authorize(ResourcePath::Logbook(logbook_id), user_id).await?;
        self.store
            .list_transactions(logbook_id)
            .await
            .map_err(Self::report)
    }

    /// Recomputes a logbook balance from its live transactions.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `NotFound` or `Storage`.
    pub async fn reconcile_logbook(
        &self,
        user_id: UserId,
        id: LogbookId,
    ) -> Result<Reconciliation, LedgerError> {
        self.authorize(ResourcePath::Logbook(id), user_id).await?;
        let outcome = self.store.reconcile_balance(id).await.map_err(Self::report)?;
        if outcome.drift() == 0 {
            info!(logbook_id = %id, balance = outcome.balance, "balance consistent");
        } else {
            warn!(
                logbook_id = %id,
                previous = outcome.previous_balance,
                balance = outcome.balance,
                "balance drift corrected"
            );
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Creates a transaction and credits its logbook.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the target logbook belongs to someone else,
    /// `Validation` for a bad amount or a deleted logbook, and `Storage` if
    /// the write fails.
    pub async fn create_transaction(
        &self,
        user_id: UserId,
        input: CreateTransactionInput,
    ) -> Result<Transaction, LedgerError> {
        if let Some(logbook_id) = input.logbook_id {
            self.authorize(ResourcePath::Logbook(logbook_id), user_id).await?;
        }

        let amount = match input.amount.as_ref() {
            None | Some(Value::Null) => 0,
            Some(raw) => parse_amount(raw)?,
        };
        let created = now();
        let new = NewTransaction {
            id: TransactionId::new(),
            owner_id: user_id,
            logbook_id: input.logbook_id,
            summary: name_or_default(input.summary.as_deref(), DEFAULT_TRANSACTION_SUMMARY),
            amount,
            occurred: Some(occurred_on_create(input.occurred.as_ref(), created)),
            created,
        };

        let transaction = self
            .store
            .insert_transaction(new)
            .await
            .map_err(Self::report)?;
        info!(
            transaction_id = %transaction.id,
            logbook_id = ?transaction.logbook_id,
            amount = transaction.amount,
            "transaction created"
        );
        self.events.emit(ResourceEvent::Created {
            resource: ResourcePath::Transaction(transaction.id),
            owner: user_id,
        });
        Ok(transaction)
    }

    /// Fetches a transaction, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs and `Forbidden` for foreign ones.
    pub async fn fetch_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self
            .store
            .find_transaction(id)
            .await
            .map_err(Self::report)?
            .ok_or_else(|| LedgerError::NotFound(format!("Transaction {id}")))?;
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        Ok(transaction)
    }

    async fn mutate_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
        change: TransactionChange,
    ) -> Result<Transaction, LedgerError> {
        let updated = self
            .store
            .update_transaction(id, change)
            .await
            .map_err(Self::report)?;
        debug!(transaction_id = %id, user_id = %user_id, "transaction updated");
        Ok(updated)
    }

    /// Amends a transaction amount.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `Validation` for non-integer amounts or deleted
    /// transactions, `Storage`, or `PartialCommit` in two-phase mode.
    pub async fn change_transaction_amount(
        &self,
        user_id: UserId,
        id: TransactionId,
        value: &Value,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        let amount = parse_amount(value)?;
        self.mutate_transaction(user_id, id, TransactionChange::Amount(amount))
            .await
    }

    /// Replaces a transaction summary.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` unless `value` is a string.
    pub async fn change_transaction_summary(
        &self,
        user_id: UserId,
        id: TransactionId,
        value: &Value,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        let summary = expect_string(value, "Summary")?.to_string();
        self.mutate_transaction(user_id, id, TransactionChange::Summary(summary))
            .await
    }

    /// Sets or clears `Occurred`.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` for anything but `"now"`, an
    /// integer, or `null` (when the configured policy allows it).
    pub async fn change_transaction_occurred(
        &self,
        user_id: UserId,
        id: TransactionId,
        value: &Value,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        let update = OccurredUpdate::parse(value, self.settings.occurred_null)?;
        self.mutate_transaction(user_id, id, TransactionChange::Occurred(update.resolve(now())))
            .await
    }

    /// Re-assigns a transaction to another logbook, or unassigns it for `null`.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the caller owns both the transaction and the
    /// target logbook, and `Validation` for malformed IDs or a deleted target.
    pub async fn move_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
        value: &Value,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        let target = match value {
            Value::Null => None,
            Value::String(raw) => Some(raw.parse::<LogbookId>().map_err(|_| {
                LedgerError::Validation(format!("LogbookId must be a UUID, got {raw:?}"))
            })?),
            other => {
                return Err(LedgerError::Validation(format!(
                    "LogbookId must be a UUID or null, got {other}"
                )));
            }
        };
        if let Some(logbook_id) = target {
            self.authorize(ResourcePath::Logbook(logbook_id), user_id).await?;
        }
        self.mutate_transaction(user_id, id, TransactionChange::Logbook(target))
            .await
    }

    /// Soft-deletes a transaction and debits its logbook.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `Validation` if already deleted, `Storage`, or
    /// `PartialCommit` in two-phase mode.
    pub async fn delete_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(ResourcePath::Transaction(id), user_id).await?;
        self.mutate_transaction(user_id, id, TransactionChange::Delete { at: now() })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::balance::{BalanceDelta, apply_delta, live_total, plan_deltas};
    use crate::ledger::error::GateError;
    use crate::ledger::resource::Access;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store applying deltas the same way the database does.
    #[derive(Default)]
    struct MockStore {
        logbooks: Mutex<HashMap<LogbookId, Logbook>>,
        transactions: Mutex<HashMap<TransactionId, Transaction>>,
        fail_balance: Mutex<bool>,
    }

    impl MockStore {
        fn balance(&self, id: LogbookId) -> i64 {
            self.logbooks.lock().unwrap()[&id].balance
        }

        fn apply(&self, deltas: &[BalanceDelta]) -> Result<(), StoreError> {
            let mut logbooks = self.logbooks.lock().unwrap();
            for delta in deltas {
                let logbook = logbooks
                    .get_mut(&delta.logbook_id)
                    .ok_or(StoreError::LogbookNotFound(delta.logbook_id))?;
                logbook.balance = apply_delta(logbook.balance, delta.amount)?;
            }
            Ok(())
        }
    }

    impl LedgerStore for MockStore {
        async fn insert_logbook(&self, input: NewLogbook) -> Result<Logbook, StoreError> {
            let logbook = Logbook {
                id: input.id,
                owner_id: input.owner_id,
                name: input.name,
                currency: input.currency,
                balance: 0,
                created: input.created,
                deleted: None,
            };
            self.logbooks
                .lock()
                .unwrap()
                .insert(logbook.id, logbook.clone());
            Ok(logbook)
        }

        async fn find_logbook(&self, id: LogbookId) -> Result<Option<Logbook>, StoreError> {
            Ok(self.logbooks.lock().unwrap().get(&id).cloned())
        }

        async fn list_logbooks(&self, owner_id: UserId) -> Result<Vec<Logbook>, StoreError> {
            Ok(self
                .logbooks
                .lock()
                .unwrap()
                .values()
                .filter(|l| l.owner_id == owner_id && l.is_live())
                .cloned()
                .collect())
        }

        async fn update_logbook(
            &self,
            id: LogbookId,
            change: LogbookChange,
        ) -> Result<Logbook, StoreError> {
            let mut logbooks = self.logbooks.lock().unwrap();
            let logbook = logbooks.get_mut(&id).ok_or(StoreError::LogbookNotFound(id))?;
            if !logbook.is_live() {
                return Err(StoreError::LogbookDeleted(id));
            }
            match change {
                LogbookChange::Name(name) => logbook.name = name,
                LogbookChange::Currency(currency) => logbook.currency = currency,
                LogbookChange::Delete { at } => logbook.deleted = Some(at),
            }
            Ok(logbook.clone())
        }

        async fn insert_transaction(
            &self,
            input: NewTransaction,
        ) -> Result<Transaction, StoreError> {
            if let Some(logbook_id) = input.logbook_id {
                let logbooks = self.logbooks.lock().unwrap();
                let logbook = logbooks
                    .get(&logbook_id)
                    .ok_or(StoreError::LogbookNotFound(logbook_id))?;
                if !logbook.is_live() {
                    return Err(StoreError::LogbookDeleted(logbook_id));
                }
            }
            let transaction = input.into_transaction();
            self.apply(&plan_deltas(None, Some(&transaction))?)?;
            self.transactions
                .lock()
                .unwrap()
                .insert(transaction.id, transaction.clone());
            Ok(transaction)
        }

        async fn find_transaction(
            &self,
            id: TransactionId,
        ) -> Result<Option<Transaction>, StoreError> {
            Ok(self.transactions.lock().unwrap().get(&id).cloned())
        }

        async fn list_transactions(
            &self,
            logbook_id: LogbookId,
        ) -> Result<Vec<Transaction>, StoreError> {
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.logbook_id == Some(logbook_id) && t.is_live())
                .cloned()
                .collect())
        }

        async fn update_transaction(
            &self,
            id: TransactionId,
            change: TransactionChange,
        ) -> Result<Transaction, StoreError> {
            let before = self
                .transactions
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(StoreError::TransactionNotFound(id))?;
            if !before.is_live() {
                return Err(StoreError::TransactionDeleted(id));
            }
            if let TransactionChange::Logbook(Some(target)) = &change {
                let live = self
                    .logbooks
                    .lock()
                    .unwrap()
                    .get(target)
                    .map(Logbook::is_live)
                    .ok_or(StoreError::LogbookNotFound(*target))?;
                if !live {
                    return Err(StoreError::LogbookDeleted(*target));
                }
            }
            let after = before.with_change(&change);
            let deltas = plan_deltas(Some(&before), Some(&after))?;
            self.transactions.lock().unwrap().insert(id, after.clone());

            if *self.fail_balance.lock().unwrap() {
                if let Some(delta) = deltas.first() {
                    return Err(StoreError::PartialCommit {
                        transaction_id: id,
                        delta: *delta,
                        reason: "lock timeout".to_string(),
                    });
                }
            }
            self.apply(&deltas)?;
            Ok(after)
        }

        async fn apply_balance_delta(&self, delta: BalanceDelta) -> Result<(), StoreError> {
            self.apply(&[delta])
        }

        async fn reconcile_balance(&self, id: LogbookId) -> Result<Reconciliation, StoreError> {
            let transactions: Vec<Transaction> =
                self.transactions.lock().unwrap().values().cloned().collect();
            let balance = live_total(id, &transactions)?;
            let mut logbooks = self.logbooks.lock().unwrap();
            let logbook = logbooks.get_mut(&id).ok_or(StoreError::LogbookNotFound(id))?;
            let previous_balance = logbook.balance;
            logbook.balance = balance;
            Ok(Reconciliation {
                logbook_id: id,
                previous_balance,
                balance,
            })
        }
    }

    /// Gate that resolves ownership against the mock store.
    struct MockGate {
        store: Arc<MockStore>,
    }

    impl OwnershipGate for MockGate {
        async fn verify_ownership(
            &self,
            resource: &ResourcePath,
            user_id: UserId,
        ) -> Result<Access, GateError> {
            let owner = match resource {
                ResourcePath::Logbook(id) => {
                    self.store.logbooks.lock().unwrap().get(id).map(|l| l.owner_id)
                }
                ResourcePath::Transaction(id) => {
                    self.store.transactions.lock().unwrap().get(id).map(|t| t.owner_id)
                }
            };
            Ok(if owner == Some(user_id) {
                Access::Allow
            } else {
                Access::Deny
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ResourceEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: ResourceEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    type TestService = LedgerService<MockStore, MockGate, RecordingSink>;

    struct Fixture {
        service: TestService,
        store: Arc<MockStore>,
        sink: Arc<RecordingSink>,
        user: UserId,
    }

    fn fixture_with(settings: LedgerSettings) -> Fixture {
        let store = Arc::new(MockStore::default());
        let gate = Arc::new(MockGate {
            store: Arc::clone(&store),
        });
        let sink = Arc::new(RecordingSink::default());
        Fixture {
            service: LedgerService::new(Arc::clone(&store), gate, Arc::clone(&sink), settings),
            store,
            sink,
            user: UserId::new(),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(LedgerSettings::default())
    }

    impl Fixture {
        async fn logbook(&self) -> Logbook {
            self.service
                .create_logbook(self.user, CreateLogbookInput::default())
                .await
                .unwrap()
        }

        async fn transaction(&self, logbook_id: LogbookId, amount: i64) -> Transaction {
            self.service
                .create_transaction(
                    self.user,
                    CreateTransactionInput {
                        logbook_id: Some(logbook_id),
                        amount: Some(json!(amount)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_create_logbook_defaults() {
        let f = fixture();
        let logbook = f.logbook().await;

        assert_eq!(logbook.name, "New Logbook");
        assert_eq!(logbook.currency, "usd");
        assert_eq!(logbook.balance, 0);
        assert_eq!(logbook.owner_id, f.user);
    }

    #[tokio::test]
    async fn test_create_logbook_rejects_bad_currency() {
        let f = fixture();
        let result = f
            .service
            .create_logbook(
                f.user,
                CreateLogbookInput {
                    name: None,
                    currency: Some("dollars".into()),
                },
            )
            .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert!(f.store.logbooks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenarios_create_amend_delete() {
        let f = fixture();
        let logbook = f.logbook().await;

        let tx = f.transaction(logbook.id, 1238).await;
        assert_eq!(f.store.balance(logbook.id), 1238);

        f.service
            .change_transaction_amount(f.user, tx.id, &json!(1369))
            .await
            .unwrap();
        assert_eq!(f.store.balance(logbook.id), 1369);

        f.service.delete_transaction(f.user, tx.id).await.unwrap();
        assert_eq!(f.store.balance(logbook.id), 0);
    }

    #[tokio::test]
    async fn test_delete_one_of_two() {
        let f = fixture();
        let logbook = f.logbook().await;

        let debit = f.transaction(logbook.id, -500).await;
        f.transaction(logbook.id, 300).await;
        assert_eq!(f.store.balance(logbook.id), -200);

        f.service.delete_transaction(f.user, debit.id).await.unwrap();
        assert_eq!(f.store.balance(logbook.id), 300);
    }

    #[tokio::test]
    async fn test_double_delete_is_rejected() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 700).await;

        f.service.delete_transaction(f.user, tx.id).await.unwrap();
        let second = f.service.delete_transaction(f.user, tx.id).await;

        assert!(matches!(second, Err(LedgerError::Validation(_))));
        assert_eq!(f.store.balance(logbook.id), 0);
    }

    #[tokio::test]
    async fn test_foreign_user_is_forbidden_before_any_write() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 100).await;
        let intruder = UserId::new();

        let result = f
            .service
            .change_transaction_amount(intruder, tx.id, &json!(9_999))
            .await;

        assert!(matches!(result, Err(LedgerError::Forbidden(_))));
        assert_eq!(f.store.balance(logbook.id), 100);
    }

    #[tokio::test]
    async fn test_create_in_foreign_logbook_is_forbidden() {
        let f = fixture();
        let logbook = f.logbook().await;

        let result = f
            .service
            .create_transaction(
                UserId::new(),
                CreateTransactionInput {
                    logbook_id: Some(logbook.id),
                    amount: Some(json!(50)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(LedgerError::Forbidden(_))));
        assert_eq!(f.store.balance(logbook.id), 0);
    }

    #[tokio::test]
    async fn test_invalid_occurred_rejected_before_write() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 10).await;

        let result = f
            .service
            .change_transaction_occurred(f.user, tx.id, &json!("yesterday"))
            .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
        let stored = f.store.transactions.lock().unwrap()[&tx.id].clone();
        assert_eq!(stored, tx);
    }

    #[tokio::test]
    async fn test_occurred_null_follows_policy() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 10).await;
        let cleared = f
            .service
            .change_transaction_occurred(f.user, tx.id, &Value::Null)
            .await
            .unwrap();
        assert_eq!(cleared.occurred, None);

        let strict = fixture_with(LedgerSettings {
            occurred_null: OccurredNullPolicy::Reject,
            ..LedgerSettings::default()
        });
        let logbook = strict.logbook().await;
        let tx = strict.transaction(logbook.id, 10).await;
        let rejected = strict
            .service
            .change_transaction_occurred(strict.user, tx.id, &Value::Null)
            .await;
        assert!(matches!(rejected, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_move_transaction_between_logbooks() {
        let f = fixture();
        let from = f.logbook().await;
        let to = f.logbook().await;
        let tx = f.transaction(from.id, 250).await;

        f.service
            .move_transaction(f.user, tx.id, &json!(to.id.to_string()))
            .await
            .unwrap();
        assert_eq!(f.store.balance(from.id), 0);
        assert_eq!(f.store.balance(to.id), 250);

        f.service
            .move_transaction(f.user, tx.id, &Value::Null)
            .await
            .unwrap();
        assert_eq!(f.store.balance(to.id), 0);
    }

    #[tokio::test]
    async fn test_move_to_deleted_logbook_is_rejected() {
        let f = fixture();
        let from = f.logbook().await;
        let gone = f.logbook().await;
        let tx = f.transaction(from.id, 40).await;
        f.service.delete_logbook(f.user, gone.id).await.unwrap();

        let result = f
            .service
            .move_transaction(f.user, tx.id, &json!(gone.id.to_string()))
            .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert_eq!(f.store.balance(from.id), 40);
    }

    #[tokio::test]
    async fn test_unassigned_transaction_touches_no_balance() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f
            .service
            .create_transaction(
                f.user,
                CreateTransactionInput {
                    amount: Some(json!(999)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        f.service
            .change_transaction_amount(f.user, tx.id, &json!(5))
            .await
            .unwrap();
        f.service.delete_transaction(f.user, tx.id).await.unwrap();

        assert_eq!(f.store.balance(logbook.id), 0);
    }

    #[tokio::test]
    async fn test_partial_commit_is_reported() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 100).await;
        *f.store.fail_balance.lock().unwrap() = true;

        let result = f
            .service
            .change_transaction_amount(f.user, tx.id, &json!(150))
            .await;

        assert!(matches!(result, Err(LedgerError::PartialCommit(_))));
    }

    #[tokio::test]
    async fn test_events_only_for_creations() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 1).await;
        f.service
            .change_transaction_summary(f.user, tx.id, &json!("Lunch"))
            .await
            .unwrap();
        f.service.delete_transaction(f.user, tx.id).await.unwrap();

        let events = f.sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ResourceEvent::Created {
                    resource: ResourcePath::Logbook(logbook.id),
                    owner: f.user,
                },
                ResourceEvent::Created {
                    resource: ResourcePath::Transaction(tx.id),
                    owner: f.user,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let f = fixture();
        let result = f.service.fetch_transaction(f.user, TransactionId::new()).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deleted_transaction_is_still_fetchable() {
        let f = fixture();
        let logbook = f.logbook().await;
        let tx = f.transaction(logbook.id, 3).await;
        f.service.delete_transaction(f.user, tx.id).await.unwrap();

        let fetched = f.service.fetch_transaction(f.user, tx.id).await.unwrap();
        assert!(fetched.deleted.is_some());
        assert!(f
            .service
            .list_transactions(f.user, logbook.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_restores_drift() {
        let f = fixture();
        let logbook = f.logbook().await;
        f.transaction(logbook.id, 80).await;
        f.store
            .logbooks
            .lock()
            .unwrap()
            .get_mut(&logbook.id)
            .unwrap()
            .balance = 12;

        let outcome = f.service.reconcile_logbook(f.user, logbook.id).await.unwrap();

        assert_eq!(outcome.previous_balance, 12);
        assert_eq!(outcome.balance, 80);
        assert_eq!(f.store.balance(logbook.id), 80);
    }
}
