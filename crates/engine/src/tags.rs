//! Expense tags, scoped to one budget version.
//!
//! Within a (user, version) scope a tag name appears at most once; the
//! importer treats the name as the natural key and reuses an existing row
//! instead of minting a duplicate.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::snapshot::RowId;

/// One tag row as it travels inside a transfer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub version_id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::versions::Entity",
        from = "Column::VersionId",
        to = "super::versions::Column::Id"
    )]
    Versions,
    #[sea_orm(has_many = "super::expense_tags::Entity")]
    ExpenseTags,
}

impl Related<super::versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::expense_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for Tag {
    fn from(model: &Model) -> Self {
        Self {
            id: RowId::Text(model.id.clone()),
            name: model.name.clone(),
            color: model.color.clone(),
        }
    }
}

impl From<&Tag> for ActiveModel {
    fn from(tag: &Tag) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            version_id: ActiveValue::NotSet,
            name: ActiveValue::Set(tag.name.clone()),
            color: ActiveValue::Set(tag.color.clone()),
        }
    }
}
