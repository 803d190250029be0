//! Initial schema: logbooks and their transactions.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Logbooks::Table)
                    .if_not_exists()
                    .col(uuid(Logbooks::Id).primary_key())
                    .col(uuid(Logbooks::OwnerId))
                    .col(string(Logbooks::Name))
                    .col(string_len(Logbooks::Currency, 3))
                    .col(big_integer(Logbooks::Balance).default(0i64))
                    .col(big_integer(Logbooks::Created))
                    .col(big_integer_null(Logbooks::Deleted))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_logbooks_owner")
                    .table(Logbooks::Table)
                    .col(Logbooks::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(uuid(Transactions::Id).primary_key())
                    .col(uuid(Transactions::OwnerId))
                    .col(uuid_null(Transactions::LogbookId))
                    .col(string(Transactions::Summary))
                    .col(big_integer(Transactions::Amount).default(0i64))
                    .col(big_integer_null(Transactions::Occurred))
                    .col(big_integer_null(Transactions::Deleted))
                    .col(big_integer(Transactions::Created))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_logbook")
                            .from(Transactions::Table, Transactions::LogbookId)
                            .to(Logbooks::Table, Logbooks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Balance reconciliation scans live transactions per logbook
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_logbook")
                    .table(Transactions::Table)
                    .col(Transactions::LogbookId)
                    .col(Transactions::Deleted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Logbooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Logbooks {
    Table,
    Id,
    OwnerId,
    Name,
    Currency,
    Balance,
    Created,
    Deleted,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    OwnerId,
    LogbookId,
    Summary,
    Amount,
    Occurred,
    Deleted,
    Created,
}
