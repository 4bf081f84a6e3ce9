//! `SeaORM` Entity for books table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub book_id: Uuid,
    pub name: String,
    pub year: i32,
    /// Last account title id handed out in this book.
    pub account_title_seq: i64,
    /// Last transaction id handed out in this book.
    pub transaction_seq: i64,
    /// Last sub-transaction id handed out in this book.
    pub sub_transaction_seq: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_authorizations::Entity")]
    BookAuthorizations,
    #[sea_orm(has_many = "super::account_titles::Entity")]
    AccountTitles,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::book_authorizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookAuthorizations.def()
    }
}

impl Related<super::account_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountTitles.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
