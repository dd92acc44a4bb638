use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, Expense, ExpenseTagLink, Income, ResultEngine, Setting, Snapshot, Tag, accounts,
    expense_tags, expenses, income, settings,
    snapshot::{RowId, SnapshotVersion},
    tags,
};

use super::{Engine, with_tx};

impl Engine {
    /// Extract one (user, version) scope into a transfer payload.
    ///
    /// Runs entirely inside one read transaction, so every entity kind comes
    /// from the same point in time. Ownership is checked before any row is
    /// read. Exports take no scope lock and never block writers elsewhere.
    pub async fn export_snapshot(&self, version_id: Uuid, user_id: &str) -> ResultEngine<Snapshot> {
        with_tx!(self, |db_tx| {
            let version = self
                .require_version_owned(&db_tx, version_id, user_id)
                .await?;

            let account_models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .filter(accounts::Column::VersionId.eq(version.id.clone()))
                .all(&db_tx)
                .await?;
            let income_models = income::Entity::find()
                .filter(income::Column::UserId.eq(user_id.to_string()))
                .filter(income::Column::VersionId.eq(version.id.clone()))
                .all(&db_tx)
                .await?;
            let expense_models = expenses::Entity::find()
                .filter(expenses::Column::UserId.eq(user_id.to_string()))
                .filter(expenses::Column::VersionId.eq(version.id.clone()))
                .all(&db_tx)
                .await?;
            let tag_models = tags::Entity::find()
                .filter(tags::Column::UserId.eq(user_id.to_string()))
                .filter(tags::Column::VersionId.eq(version.id.clone()))
                .all(&db_tx)
                .await?;
            let setting_models = settings::Entity::find()
                .filter(settings::Column::UserId.eq(user_id.to_string()))
                .filter(settings::Column::VersionId.eq(version.id.clone()))
                .all(&db_tx)
                .await?;

            // Join rows live outside the scope columns; reach them through
            // the scope's expenses.
            let expense_ids: Vec<String> =
                expense_models.iter().map(|model| model.id.clone()).collect();
            let link_models = if expense_ids.is_empty() {
                Vec::new()
            } else {
                expense_tags::Entity::find()
                    .filter(expense_tags::Column::ExpenseId.is_in(expense_ids))
                    .all(&db_tx)
                    .await?
            };

            let tag_names: HashMap<&str, &str> = tag_models
                .iter()
                .map(|model| (model.id.as_str(), model.name.as_str()))
                .collect();
            let expense_links: Vec<ExpenseTagLink> = link_models
                .iter()
                .map(|link| ExpenseTagLink {
                    expense_id: RowId::Text(link.expense_id.clone()),
                    tag_id: RowId::Text(link.tag_id.clone()),
                    tag_name: tag_names
                        .get(link.tag_id.as_str())
                        .map(|name| (*name).to_string()),
                })
                .collect();

            let income_rows = income_models
                .iter()
                .map(Income::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let expense_rows = expense_models
                .iter()
                .map(Expense::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            tracing::debug!(
                user = user_id,
                version = %version_id,
                accounts = account_models.len(),
                expenses = expense_rows.len(),
                links = expense_links.len(),
                "exported snapshot"
            );

            Ok(Snapshot {
                export_date: Utc::now(),
                version: SnapshotVersion {
                    id: RowId::Text(version.id.clone()),
                    name: version.name.clone(),
                    description: version.description.clone(),
                },
                accounts: account_models.iter().map(Account::from).collect(),
                income: income_rows,
                expenses: expense_rows,
                tags: tag_models.iter().map(Tag::from).collect(),
                settings: setting_models.iter().map(Setting::from).collect(),
                expense_tags: expense_links,
            })
        })
    }
}
