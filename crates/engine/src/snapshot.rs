//! Transfer payload types.
//!
//! A [`Snapshot`] is the self-contained bundle one export produces and one
//! import consumes: version metadata plus every entity kind of a single
//! (user, version) scope. Payloads are plain serde values so they can be
//! written to disk, shipped between installations or stored as backups.
//!
//! Identifiers inside a payload are provenance, not storage keys: the
//! importer mints fresh keys and rewrites references through per-call key
//! maps, so a payload can be replayed any number of times.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, accounts::Account, expense_tags::ExpenseTagLink,
    expenses::Expense, income::Income, settings::Setting, tags::Tag,
};

/// Original row identifier carried in a payload.
///
/// Exports write UUID strings, but externally produced payloads may still
/// carry the integer keys of older storage backends; both forms resolve
/// through the same key maps on import.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(value) => write!(f, "{value}"),
            RowId::Text(value) => f.write_str(value),
        }
    }
}

/// Version metadata carried in a payload.
///
/// The id is provenance only; an import never writes it anywhere. Name and
/// description seed the destination version when a new one is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVersion {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One full budget dataset extracted from a (user, version) scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub export_date: DateTime<Utc>,
    pub version: SnapshotVersion,
    pub accounts: Vec<Account>,
    pub income: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub tags: Vec<Tag>,
    pub settings: Vec<Setting>,
    pub expense_tags: Vec<ExpenseTagLink>,
}

impl Snapshot {
    /// Structural validation, run in full before any storage access.
    ///
    /// Catches empty required names/descriptions and duplicated original ids
    /// within one entity kind. Cross-references (an expense's account, a
    /// link's tag) are not checked here; unresolvable references degrade at
    /// import time instead of failing the payload.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.version.name.trim().is_empty() {
            return Err(EngineError::InvalidSnapshot(
                "version name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.name.trim().is_empty() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "account {} has an empty name",
                    account.id
                )));
            }
            if !seen.insert(&account.id) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate account id {}",
                    account.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for income in &self.income {
            if income.description.trim().is_empty() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "income {} has an empty description",
                    income.id
                )));
            }
            if !seen.insert(&income.id) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate income id {}",
                    income.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for expense in &self.expenses {
            if expense.description.trim().is_empty() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "expense {} has an empty description",
                    expense.id
                )));
            }
            if !seen.insert(&expense.id) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate expense id {}",
                    expense.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for tag in &self.tags {
            if tag.name.trim().is_empty() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "tag {} has an empty name",
                    tag.id
                )));
            }
            if !seen.insert(&tag.id) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate tag id {}",
                    tag.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for setting in &self.settings {
            if setting.key.trim().is_empty() {
                return Err(EngineError::InvalidSnapshot(
                    "settings key must not be empty".to_string(),
                ));
            }
            if !seen.insert(&setting.key) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate settings key {}",
                    setting.key
                )));
            }
        }

        Ok(())
    }
}

/// Rows written per entity kind by one import.
///
/// A deduplicated tag does not count: the counter reports rows actually
/// inserted, not payload rows processed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub accounts: u64,
    pub income: u64,
    pub expenses: u64,
    pub tags: u64,
    pub settings: u64,
    pub expense_tags: u64,
}

/// One expense/tag link the importer could not resolve, in original payload
/// keys so the caller can point back at the source data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTagLink {
    pub expense_id: RowId,
    pub tag_id: RowId,
}

/// Rows an import skipped instead of failing on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRows {
    pub expense_tags: Vec<SkippedTagLink>,
}

/// Result of one import: where the data landed and what happened to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub version_id: Uuid,
    pub imported: ImportCounts,
    pub skipped: SkippedRows,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::Frequency;

    use super::*;

    fn snapshot() -> Snapshot {
        let next_due = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        Snapshot {
            export_date: Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap(),
            version: SnapshotVersion {
                id: RowId::Int(1),
                name: "Main".to_string(),
                description: Some("household".to_string()),
            },
            accounts: vec![Account {
                id: RowId::Int(10),
                name: "Checking".to_string(),
                bank: "First National".to_string(),
                current_balance: 125_000,
                required_balance: 80_000,
                is_primary: true,
                diff: 45_000,
            }],
            income: vec![],
            expenses: vec![Expense {
                id: RowId::Text("e1".to_string()),
                description: "Rent".to_string(),
                amount: 95_000,
                frequency: Frequency::Monthly,
                next_due,
                apply_fuzziness: false,
                notes: None,
                account_id: Some(RowId::Int(10)),
            }],
            tags: vec![Tag {
                id: RowId::Int(1),
                name: "Home".to_string(),
                color: None,
            }],
            settings: vec![Setting {
                key: "currency".to_string(),
                value: "EUR".to_string(),
            }],
            expense_tags: vec![ExpenseTagLink {
                expense_id: RowId::Text("e1".to_string()),
                tag_id: RowId::Int(1),
                tag_name: Some("Home".to_string()),
            }],
        }
    }

    #[test]
    fn row_ids_accept_integers_and_strings() {
        let parsed: Vec<RowId> = serde_json::from_str(r#"[7, "e1"]"#).unwrap();
        assert_eq!(parsed, vec![RowId::Int(7), RowId::Text("e1".to_string())]);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"[7,"e1"]"#);
    }

    #[test]
    fn complete_payload_validates() {
        snapshot().validate().unwrap();
    }

    #[test]
    fn empty_version_name_is_rejected() {
        let mut payload = snapshot();
        payload.version.name = "   ".to_string();
        let err = payload.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidSnapshot("version name must not be empty".to_string())
        );
    }

    #[test]
    fn empty_tag_name_is_rejected() {
        let mut payload = snapshot();
        payload.tags.push(Tag {
            id: RowId::Int(77),
            name: String::new(),
            color: None,
        });
        let err = payload.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidSnapshot("tag 77 has an empty name".to_string())
        );
    }

    #[test]
    fn duplicated_original_ids_are_rejected() {
        let mut payload = snapshot();
        payload.accounts.push(payload.accounts[0].clone());
        let err = payload.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidSnapshot("duplicate account id 10".to_string())
        );
    }

    #[test]
    fn duplicated_settings_keys_are_rejected() {
        let mut payload = snapshot();
        payload.settings.push(Setting {
            key: "currency".to_string(),
            value: "USD".to_string(),
        });
        let err = payload.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidSnapshot("duplicate settings key currency".to_string())
        );
    }

    #[test]
    fn payload_serializes_with_external_key_names() {
        let value = serde_json::to_value(snapshot()).unwrap();
        assert!(value.get("exportDate").is_some());
        assert!(value.get("expenseTags").is_some());
        assert_eq!(value["version"]["name"], "Main");
        assert_eq!(value["expenses"][0]["accountId"], 10);
        assert_eq!(value["expenseTags"][0]["expense_id"], "e1");
        assert_eq!(value["expenseTags"][0]["tag_name"], "Home");
    }

    #[test]
    fn summary_serializes_with_external_key_names() {
        let summary = ImportSummary {
            version_id: Uuid::nil(),
            imported: ImportCounts {
                expense_tags: 3,
                ..ImportCounts::default()
            },
            skipped: SkippedRows {
                expense_tags: vec![SkippedTagLink {
                    expense_id: RowId::Text("e1".to_string()),
                    tag_id: RowId::Int(99),
                }],
            },
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("versionId").is_some());
        assert_eq!(value["imported"]["expenseTags"], 3);
        assert_eq!(value["skipped"]["expenseTags"][0]["tag_id"], 99);
    }
}
