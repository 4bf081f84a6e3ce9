//! Initial database migration.
//!
//! Tables are generated from the entity definitions so the same migration
//! runs on Postgres and SQLite. Parents are created before children because
//! the composite foreign keys are declared inline.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entities::{
    account_titles, book_authorizations, books, sub_transactions, transactions, users,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: TABLES
        // ============================================================
        create_table(manager, users::Entity).await?;
        create_table(manager, books::Entity).await?;
        create_table(manager, book_authorizations::Entity).await?;
        create_table(manager, account_titles::Entity).await?;
        create_table(manager, transactions::Entity).await?;
        create_table(manager, sub_transactions::Entity).await?;

        // ============================================================
        // PART 2: INDEXES
        // ============================================================
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_book_authorizations_user")
                    .table(book_authorizations::Entity)
                    .col(book_authorizations::Column::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_book_occurred")
                    .table(transactions::Entity)
                    .col(transactions::Column::BookId)
                    .col(transactions::Column::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sub_transactions_transaction")
                    .table(sub_transactions::Entity)
                    .col(sub_transactions::Column::BookId)
                    .col(sub_transactions::Column::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sub_transactions_account_title")
                    .table(sub_transactions::Entity)
                    .col(sub_transactions::Column::BookId)
                    .col(sub_transactions::Column::AccountTitleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, sub_transactions::Entity).await?;
        drop_table(manager, transactions::Entity).await?;
        drop_table(manager, account_titles::Entity).await?;
        drop_table(manager, book_authorizations::Entity).await?;
        drop_table(manager, books::Entity).await?;
        drop_table(manager, users::Entity).await?;
        Ok(())
    }
}

async fn create_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let schema = Schema::new(manager.get_database_backend());
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

async fn drop_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
