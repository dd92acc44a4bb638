//! Expense/tag join rows.
//!
//! The stored row is just the two keys. The payload row additionally carries
//! a denormalized `tag_name`, written at export time so a consumer can still
//! label the link even if the tag row has disappeared since. The name is
//! never used to resolve anything on import.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::snapshot::RowId;

/// One join row as it travels inside a transfer payload.
///
/// Field names stay snake_case: payloads of this table predate the camelCase
/// convention used everywhere else and existing files must keep parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseTagLink {
    pub expense_id: RowId,
    pub tag_id: RowId,
    #[serde(default)]
    pub tag_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expense_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id"
    )]
    Expenses,
    #[sea_orm(
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id"
    )]
    Tags,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
