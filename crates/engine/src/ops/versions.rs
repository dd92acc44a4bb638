use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, Statement, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BudgetVersion, EngineError, ResultEngine, snapshot::ImportSummary, users, versions,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Create an empty budget version for `user_id`.
    ///
    /// The new version starts inactive; names are labels and may repeat.
    pub async fn new_version(
        &self,
        name: &str,
        description: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "version")?;
        let description = normalize_optional_text(description);
        let version_id = Uuid::new_v4();
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let version = versions::ActiveModel {
                id: ActiveValue::Set(version_id.to_string()),
                name: ActiveValue::Set(name.clone()),
                description: ActiveValue::Set(description.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
            };
            version.insert(&db_tx).await?;
            tracing::debug!(user = user_id, version = %version_id, "created version");
            Ok(version_id)
        })
    }

    /// Duplicate a whole version under a new name for the same user.
    ///
    /// Implemented as export followed by import, so references are rewritten
    /// exactly as they would be for an external payload.
    pub async fn copy_version(
        &self,
        source_id: Uuid,
        new_name: &str,
        user_id: &str,
    ) -> ResultEngine<ImportSummary> {
        let new_name = normalize_required_name(new_name, "version")?;
        let mut snapshot = self.export_snapshot(source_id, user_id).await?;
        snapshot.version.name = new_name;
        self.import_snapshot(snapshot, None, user_id).await
    }

    /// Point the user's active-version marker at `version_id`.
    pub async fn activate_version(&self, version_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_version_owned(&db_tx, version_id, user_id)
                .await?;
            let user = users::ActiveModel {
                username: ActiveValue::Set(user_id.to_string()),
                active_version_id: ActiveValue::Set(Some(version_id.to_string())),
            };
            user.update(&db_tx).await?;
            tracing::debug!(user = user_id, version = %version_id, "activated version");
            Ok(())
        })
    }

    /// Delete a version and every row scoped to it.
    ///
    /// Refused for the active version and for the user's last remaining one.
    pub async fn delete_version(&self, version_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let _guard = self
            .write_locks
            .scope_lock(user_id, version_id)
            .lock_owned()
            .await;

        with_tx!(self, |db_tx| {
            self.require_version_owned(&db_tx, version_id, user_id)
                .await?;
            let user = self.find_user(&db_tx, user_id).await?;
            let version_key = version_id.to_string();
            if user.active_version_id.as_deref() == Some(version_key.as_str()) {
                return Err(EngineError::InvalidVersion(
                    "cannot delete the active version".to_string(),
                ));
            }
            if self.count_user_versions(&db_tx, user_id).await? <= 1 {
                return Err(EngineError::InvalidVersion(
                    "cannot delete the last version".to_string(),
                ));
            }

            // Explicit cascade within one DB transaction, children first;
            // not every relationship is FK-backed.
            let backend = self.database.get_database_backend();

            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM expense_tags WHERE expense_id IN (SELECT id FROM expenses WHERE version_id = ?);",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM expenses WHERE version_id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM income WHERE version_id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM accounts WHERE version_id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM tags WHERE version_id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM settings WHERE version_id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM budget_versions WHERE id = ?;",
                    vec![version_key.clone().into()],
                ))
                .await?;

            tracing::debug!(user = user_id, version = %version_id, "deleted version");
            Ok(())
        })
    }

    /// List the user's versions, name-sorted, with the active flag resolved.
    pub async fn list_versions(&self, user_id: &str) -> ResultEngine<Vec<BudgetVersion>> {
        with_tx!(self, |db_tx| {
            let user = self.find_user(&db_tx, user_id).await?;
            let models = versions::Entity::find()
                .filter(versions::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(versions::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(|model| {
                    BudgetVersion::try_from_model(model, user.active_version_id.as_deref())
                })
                .collect()
        })
    }
}
