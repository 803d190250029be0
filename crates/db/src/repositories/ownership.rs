//! Ownership checks against the owner columns of logbooks and transactions.

use sea_orm::{DatabaseConnection, EntityTrait, QuerySelect};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{logbooks, transactions};
use moneylog_core::ledger::{Access, GateError, OwnershipGate, ResourcePath};
use moneylog_shared::types::UserId;

/// Ownership gate backed by the ledger tables.
#[derive(Debug, Clone)]
pub struct OwnershipRepository {
    db: DatabaseConnection,
}

impl OwnershipRepository {
    /// Creates a new ownership repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl OwnershipGate for OwnershipRepository {
    async fn verify_ownership(
        &self,
        resource: &ResourcePath,
        user_id: UserId,
    ) -> Result<Access, GateError> {
        let owner: Option<Uuid> = match resource {
            ResourcePath::Logbook(id) => {
                logbooks::Entity::find_by_id(id.into_inner())
                    .select_only()
                    .column(logbooks::Column::OwnerId)
                    .into_tuple::<Uuid>()
                    .one(&self.db)
                    .await
            }
            ResourcePath::Transaction(id) => {
                transactions::Entity::find_by_id(id.into_inner())
                    .select_only()
                    .column(transactions::Column::OwnerId)
                    .into_tuple::<Uuid>()
                    .one(&self.db)
                    .await
            }
        }
        .map_err(|e| GateError::Backend(e.to_string()))?;

        let access = if owner == Some(user_id.into_inner()) {
            Access::Allow
        } else {
            Access::Deny
        };
        debug!(resource = %resource, user_id = %user_id, ?access, "ownership resolved");
        Ok(access)
    }
}
