//! Recurring expense records, scoped to one budget version.
//!
//! An expense may point at the account it is paid from. The reference is
//! optional and soft: an expense whose source account is unknown simply
//! carries no account.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Frequency, snapshot::RowId};

/// One expense row as it travels inside a transfer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: RowId,
    pub description: String,
    pub amount: i64,
    pub frequency: Frequency,
    pub next_due: DateTime<Utc>,
    pub apply_fuzziness: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub account_id: Option<RowId>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
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
    pub notes: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::versions::Entity",
        from = "Column::VersionId",
        to = "super::versions::Column::Id"
    )]
    Versions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(has_many = "super::expense_tags::Entity")]
    ExpenseTags,
}

impl Related<super::versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::expense_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Model> for Expense {
    type Error = EngineError;

    fn try_from(model: &Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RowId::Text(model.id.clone()),
            description: model.description.clone(),
            amount: model.amount,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            next_due: model.next_due,
            apply_fuzziness: model.apply_fuzziness,
            notes: model.notes.clone(),
            account_id: model.account_id.as_ref().map(|id| RowId::Text(id.clone())),
        })
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            version_id: ActiveValue::NotSet,
            description: ActiveValue::Set(expense.description.clone()),
            amount: ActiveValue::Set(expense.amount),
            frequency: ActiveValue::Set(expense.frequency.as_str().to_string()),
            next_due: ActiveValue::Set(expense.next_due),
            apply_fuzziness: ActiveValue::Set(expense.apply_fuzziness),
            notes: ActiveValue::Set(expense.notes.clone()),
            // Original reference; the importer replaces it with a minted key
            // or drops it.
            account_id: ActiveValue::NotSet,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn optional_fields_may_be_omitted_in_payloads() {
        let json = r#"{
            "id": "e1",
            "description": "Rent",
            "amount": 95000,
            "frequency": "monthly",
            "nextDue": "2026-09-01T00:00:00Z",
            "applyFuzziness": false
        }"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.id, RowId::Text("e1".to_string()));
        assert_eq!(expense.notes, None);
        assert_eq!(expense.account_id, None);
    }

    #[test]
    fn account_reference_uses_camel_case_key() {
        let expense = Expense {
            id: RowId::Int(30),
            description: "Rent".to_string(),
            amount: 95_000,
            frequency: Frequency::Monthly,
            next_due: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
            apply_fuzziness: false,
            notes: None,
            account_id: Some(RowId::Int(10)),
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["accountId"], 10);
        assert_eq!(value["applyFuzziness"], false);
    }
}
