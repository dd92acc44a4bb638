use std::collections::HashSet;

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Tag, accounts, expense_tags, expenses, income,
    remap::SnapshotRemap,
    settings,
    snapshot::{ImportCounts, ImportSummary, SkippedRows, SkippedTagLink, Snapshot},
    tags, versions,
};

use super::Engine;

impl Engine {
    /// Replay a transfer payload into a destination version owned by
    /// `user_id`.
    ///
    /// With `destination = None` a brand-new version is created, named and
    /// described from the payload's version metadata; otherwise the payload
    /// lands in the given existing version and the payload metadata is
    /// ignored.
    ///
    /// Reconstruction follows the dependency order version, accounts, tags,
    /// income, expenses, expense/tag links, settings. Fresh keys are minted
    /// for every inserted row; original payload keys only feed the per-call
    /// key maps that rewrite references. Tags resolve by name against the
    /// destination, so replaying a payload never duplicates a tag. Links
    /// whose expense or tag cannot be resolved are skipped and reported; any
    /// storage error rolls the whole import back.
    ///
    /// Writers on the same (user, version) scope are serialized; writers on
    /// other scopes proceed concurrently.
    pub async fn import_snapshot(
        &self,
        snapshot: Snapshot,
        destination: Option<Uuid>,
        user_id: &str,
    ) -> ResultEngine<ImportSummary> {
        tracing::debug!(user = user_id, "validating snapshot payload");
        snapshot.validate()?;

        // Fix the destination id before queueing so the scope lock also
        // covers creation of a brand-new version.
        let version_id = destination.unwrap_or_else(Uuid::new_v4);
        let _guard = self
            .write_locks
            .scope_lock(user_id, version_id)
            .lock_owned()
            .await;

        tracing::debug!(user = user_id, version = %version_id, "writing snapshot");
        let db_tx = self.database.begin().await?;
        match self
            .reconstruct(&db_tx, &snapshot, version_id, destination.is_some(), user_id)
            .await
        {
            Ok(summary) => {
                db_tx.commit().await?;
                tracing::debug!(
                    user = user_id,
                    version = %version_id,
                    accounts = summary.imported.accounts,
                    income = summary.imported.income,
                    expenses = summary.imported.expenses,
                    tags = summary.imported.tags,
                    settings = summary.imported.settings,
                    links = summary.imported.expense_tags,
                    "import committed"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = db_tx.rollback().await {
                    tracing::error!(
                        user = user_id,
                        version = %version_id,
                        error = %rollback_err,
                        "rollback after failed import also failed"
                    );
                } else {
                    tracing::debug!(user = user_id, version = %version_id, "import rolled back");
                }
                Err(err)
            }
        }
    }

    async fn reconstruct(
        &self,
        db_tx: &DatabaseTransaction,
        snapshot: &Snapshot,
        version_id: Uuid,
        into_existing: bool,
        user_id: &str,
    ) -> ResultEngine<ImportSummary> {
        if into_existing {
            self.require_version_owned(db_tx, version_id, user_id)
                .await?;
        } else {
            self.require_user_exists(db_tx, user_id).await?;
            let version = versions::ActiveModel {
                id: ActiveValue::Set(version_id.to_string()),
                name: ActiveValue::Set(snapshot.version.name.trim().to_string()),
                description: ActiveValue::Set(snapshot.version.description.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
            };
            version.insert(db_tx).await?;
        }

        let mut remap = SnapshotRemap::default();
        let mut counts = ImportCounts::default();

        for account in &snapshot.accounts {
            let minted = Uuid::new_v4();
            let mut active: accounts::ActiveModel = account.into();
            active.id = ActiveValue::Set(minted.to_string());
            active.user_id = ActiveValue::Set(user_id.to_string());
            active.version_id = ActiveValue::Set(version_id.to_string());
            active.insert(db_tx).await?;
            remap.accounts.record(account.id.clone(), minted);
            counts.accounts += 1;
        }

        for tag in &snapshot.tags {
            let id = self
                .resolve_tag(db_tx, tag, version_id, user_id, &mut counts)
                .await?;
            remap.tags.record(tag.id.clone(), id);
        }

        for income_row in &snapshot.income {
            let minted = Uuid::new_v4();
            let mut active: income::ActiveModel = income_row.into();
            active.id = ActiveValue::Set(minted.to_string());
            active.user_id = ActiveValue::Set(user_id.to_string());
            active.version_id = ActiveValue::Set(version_id.to_string());
            active.insert(db_tx).await?;
            remap.income.record(income_row.id.clone(), minted);
            counts.income += 1;
        }

        for expense in &snapshot.expenses {
            let minted = Uuid::new_v4();
            let account_id = expense
                .account_id
                .as_ref()
                .and_then(|original| remap.accounts.resolve(original));
            let mut active: expenses::ActiveModel = expense.into();
            active.id = ActiveValue::Set(minted.to_string());
            active.user_id = ActiveValue::Set(user_id.to_string());
            active.version_id = ActiveValue::Set(version_id.to_string());
            // A reference the payload cannot resolve degrades to "no
            // account".
            active.account_id = ActiveValue::Set(account_id.map(|id| id.to_string()));
            active.insert(db_tx).await?;
            remap.expenses.record(expense.id.clone(), minted);
            counts.expenses += 1;
        }

        let mut skipped = Vec::new();
        let mut inserted_pairs = HashSet::new();
        for link in &snapshot.expense_tags {
            let expense_id = remap.expenses.resolve(&link.expense_id);
            let tag_id = remap.tags.resolve(&link.tag_id);
            let (Some(expense_id), Some(tag_id)) = (expense_id, tag_id) else {
                skipped.push(SkippedTagLink {
                    expense_id: link.expense_id.clone(),
                    tag_id: link.tag_id.clone(),
                });
                continue;
            };
            // Tag dedup can collapse two source links onto one pair.
            if !inserted_pairs.insert((expense_id, tag_id)) {
                continue;
            }
            let active = expense_tags::ActiveModel {
                expense_id: ActiveValue::Set(expense_id.to_string()),
                tag_id: ActiveValue::Set(tag_id.to_string()),
            };
            active.insert(db_tx).await?;
            counts.expense_tags += 1;
        }

        for setting in &snapshot.settings {
            let mut active: settings::ActiveModel = setting.into();
            active.user_id = ActiveValue::Set(user_id.to_string());
            active.version_id = ActiveValue::Set(version_id.to_string());
            active.insert(db_tx).await?;
            counts.settings += 1;
        }

        if !skipped.is_empty() {
            tracing::warn!(
                user = user_id,
                version = %version_id,
                skipped = skipped.len(),
                "skipped expense/tag links with unresolvable references"
            );
        }

        Ok(ImportSummary {
            version_id,
            imported: counts,
            skipped: SkippedRows {
                expense_tags: skipped,
            },
        })
    }

    /// Select-or-insert on the (user, version, name) natural key.
    ///
    /// Existing tags are never updated or renumbered, so keys minted earlier
    /// in the same import stay valid.
    async fn resolve_tag(
        &self,
        db_tx: &DatabaseTransaction,
        tag: &Tag,
        version_id: Uuid,
        user_id: &str,
        counts: &mut ImportCounts,
    ) -> ResultEngine<Uuid> {
        let existing = tags::Entity::find()
            .filter(tags::Column::UserId.eq(user_id.to_string()))
            .filter(tags::Column::VersionId.eq(version_id.to_string()))
            .filter(tags::Column::Name.eq(tag.name.clone()))
            .one(db_tx)
            .await?;
        if let Some(model) = existing {
            return Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId(format!("malformed tag id: {}", model.id)));
        }

        let minted = Uuid::new_v4();
        let mut active: tags::ActiveModel = tag.into();
        active.id = ActiveValue::Set(minted.to_string());
        active.user_id = ActiveValue::Set(user_id.to_string());
        active.version_id = ActiveValue::Set(version_id.to_string());
        active.insert(db_tx).await?;
        counts.tags += 1;
        Ok(minted)
    }
}
