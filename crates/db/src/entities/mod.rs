//! `SeaORM` entity definitions.

pub mod logbooks;
pub mod transactions;

pub mod prelude {
    //! Entity re-exports.
    pub use super::logbooks::Entity as Logbooks;
    pub use super::transactions::Entity as Transactions;
}
