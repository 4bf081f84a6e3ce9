//! `SeaORM` Entity for sub_transactions table (transaction legs).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sub_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub book_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sub_transaction_id: i64,
    pub transaction_id: i64,
    pub account_title_id: i64,
    pub is_debit: bool,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "(Column::BookId, Column::TransactionId)",
        to = "(super::transactions::Column::BookId, super::transactions::Column::TransactionId)"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::account_titles::Entity",
        from = "(Column::BookId, Column::AccountTitleId)",
        to = "(super::account_titles::Column::BookId, super::account_titles::Column::AccountTitleId)"
    )]
    AccountTitles,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::account_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountTitles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
