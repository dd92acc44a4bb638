//! Recurring income records, scoped to one budget version.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Frequency, snapshot::RowId};

/// One income row as it travels inside a transfer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: RowId,
    pub description: String,
    pub amount: i64,
    pub frequency: Frequency,
    pub next_due: DateTime<Utc>,
    pub apply_fuzziness: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "income")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub version_id: String,
    pub description: String,
    pub amount: i64,
    pub frequency: String,
    pub next_due: DateTimeUtc,
    pub apply_fuzziness: bool,
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

impl TryFrom<&Model> for Income {
    type Error = EngineError;

    fn try_from(model: &Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RowId::Text(model.id.clone()),
            description: model.description.clone(),
            amount: model.amount,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            next_due: model.next_due,
            apply_fuzziness: model.apply_fuzziness,
        })
    }
}

impl From<&Income> for ActiveModel {
    fn from(income: &Income) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            version_id: ActiveValue::NotSet,
            description: ActiveValue::Set(income.description.clone()),
            amount: ActiveValue::Set(income.amount),
            frequency: ActiveValue::Set(income.frequency.as_str().to_string()),
            next_due: ActiveValue::Set(income.next_due),
            apply_fuzziness: ActiveValue::Set(income.apply_fuzziness),
        }
    }
}
