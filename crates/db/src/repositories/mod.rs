//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

mod balance;
pub mod ledger;
pub mod ownership;

pub use ledger::LedgerRepository;
pub use ownership::OwnershipRepository;
