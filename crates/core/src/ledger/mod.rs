//! Logbooks, transactions and the balance consistency engine.
//!
//! - `balance` - delta algebra shared by every mutation
//! - `types` - domain records and change descriptions
//! - `occurred` / `validation` - input parsing
//! - `resource` - ownership paths
//! - `store` - storage and ownership traits
//! - `events` - creation notifications
//! - `service` - mutation handlers

pub mod balance;
pub mod error;
pub mod events;
pub mod occurred;
pub mod resource;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

pub use balance::{BalanceDelta, Overflow, contribution, live_total, plan_deltas};
pub use error::{GateError, LedgerError, StoreError};
pub use events::{BroadcastEventSink, EventSink, ResourceEvent};
pub use occurred::OccurredUpdate;
pub use resource::{Access, InvalidResourcePath, ResourcePath};
pub use service::{CreateLogbookInput, CreateTransactionInput, LedgerService, LedgerSettings};
pub use store::{LedgerStore, OwnershipGate};
pub use types::{
    Logbook, LogbookChange, NewLogbook, NewTransaction, Reconciliation, Transaction,
    TransactionChange,
};
