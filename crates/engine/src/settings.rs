//! Opaque key/value settings, scoped to one (user, version) pair.
//!
//! The engine never interprets values; it only moves them.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// One settings row as it travels inside a transfer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub version_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::versions::Entity",
        from = "Column::VersionId",
        to = "super::versions::Column::Id"
    )]
    Versions,
}

impl Related<super::versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for Setting {
    fn from(model: &Model) -> Self {
        Self {
            key: model.key.clone(),
            value: model.value.clone(),
        }
    }
}

impl From<&Setting> for ActiveModel {
    fn from(setting: &Setting) -> Self {
        Self {
            user_id: ActiveValue::NotSet,
            version_id: ActiveValue::NotSet,
            key: ActiveValue::Set(setting.key.clone()),
            value: ActiveValue::Set(setting.value.clone()),
        }
    }
}
