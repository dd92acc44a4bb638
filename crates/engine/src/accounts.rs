//! Bank/holding accounts, scoped to one budget version.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::snapshot::RowId;

/// One account row as it travels inside a transfer payload.
///
/// Balances are integer minor units. `diff` is the denormalized gap between
/// current and required balance kept for the outer application; the engine
/// carries it through export/import untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: RowId,
    pub name: String,
    pub bank: String,
    pub current_balance: i64,
    pub required_balance: i64,
    pub is_primary: bool,
    pub diff: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub version_id: String,
    pub name: String,
    pub bank: String,
    pub current_balance: i64,
    pub required_balance: i64,
    pub is_primary: bool,
    pub diff: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::versions::Entity",
        from = "Column::VersionId",
        to = "super::versions::Column::Id"
    )]
    Versions,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for Account {
    fn from(model: &Model) -> Self {
        Self {
            id: RowId::Text(model.id.clone()),
            name: model.name.clone(),
            bank: model.bank.clone(),
            current_balance: model.current_balance,
            required_balance: model.required_balance,
            is_primary: model.is_primary,
            diff: model.diff,
        }
    }
}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            version_id: ActiveValue::NotSet,
            name: ActiveValue::Set(account.name.clone()),
            bank: ActiveValue::Set(account.bank.clone()),
            current_balance: ActiveValue::Set(account.current_balance),
            required_balance: ActiveValue::Set(account.required_balance),
            is_primary: ActiveValue::Set(account.is_primary),
            diff: ActiveValue::Set(account.diff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keys_are_camel_case() {
        let account = Account {
            id: RowId::Int(10),
            name: "Checking".to_string(),
            bank: "First National".to_string(),
            current_balance: 125_000,
            required_balance: 80_000,
            is_primary: true,
            diff: 45_000,
        };
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["currentBalance"], 125_000);
        assert_eq!(value["requiredBalance"], 80_000);
        assert_eq!(value["isPrimary"], true);
        assert_eq!(value["diff"], 45_000);
    }

    #[test]
    fn model_round_trips_into_payload_row() {
        let model = Model {
            id: "9f0c".to_string(),
            user_id: "alice".to_string(),
            version_id: "v1".to_string(),
            name: "Savings".to_string(),
            bank: "Coop".to_string(),
            current_balance: 7,
            required_balance: 0,
            is_primary: false,
            diff: 7,
        };
        let account = Account::from(&model);
        assert_eq!(account.id, RowId::Text("9f0c".to_string()));
        assert_eq!(account.bank, "Coop");

        let active: ActiveModel = (&account).into();
        assert!(matches!(active.id, ActiveValue::NotSet));
        assert!(matches!(active.user_id, ActiveValue::NotSet));
        assert_eq!(active.name.unwrap(), "Savings");
    }
}
