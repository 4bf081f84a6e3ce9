//! `SeaORM` Entity for account_titles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account_titles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub book_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_title_id: i64,
    pub name: String,
    /// Type code 0..=3; even codes are debit-normal.
    pub account_type: i32,
    /// Running balance in the smallest currency unit.
    pub amount: i64,
    /// Opening or carried-forward balance.
    pub amount_base: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::BookId"
    )]
    Books,
    #[sea_orm(has_many = "super::sub_transactions::Entity")]
    SubTransactions,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl Related<super::sub_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
