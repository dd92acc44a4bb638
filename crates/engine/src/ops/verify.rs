use sea_orm::{Statement, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ResultEngine;

use super::{Engine, with_tx};

/// One expense/tag link whose tag no longer exists in the link's scope.
///
/// Reported in storage keys, since the rows live in storage rather than in
/// any payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedTagLink {
    pub expense_id: String,
    pub tag_id: String,
    pub version_id: String,
    pub user_id: String,
}

const ORPHAN_SCAN: &str = "SELECT et.expense_id, et.tag_id, e.version_id, e.user_id \
     FROM expense_tags et \
     INNER JOIN expenses e ON e.id = et.expense_id \
     LEFT JOIN tags t ON t.id = et.tag_id AND t.user_id = e.user_id AND t.version_id = e.version_id \
     WHERE t.id IS NULL";

impl Engine {
    /// Report expense/tag links in one scope whose tag row no longer exists,
    /// deleting them when `repair` is set.
    ///
    /// The link table carries no FK on the tag side, so a tag removed out of
    /// band leaves its links behind; this pass finds them. The scan itself
    /// is read-only and takes no scope lock; a repair queues behind writers
    /// of the same scope.
    pub async fn verify_tag_links(
        &self,
        version_id: Uuid,
        user_id: &str,
        repair: bool,
    ) -> ResultEngine<Vec<OrphanedTagLink>> {
        let _guard = if repair {
            Some(
                self.write_locks
                    .scope_lock(user_id, version_id)
                    .lock_owned()
                    .await,
            )
        } else {
            None
        };
        self.scan_tag_links(Some((version_id, user_id)), repair)
            .await
    }

    /// The same scan across every scope in the store.
    ///
    /// Maintenance entry point for operators; it bypasses ownership checks
    /// and takes no scope locks.
    pub async fn verify_all_tag_links(&self, repair: bool) -> ResultEngine<Vec<OrphanedTagLink>> {
        self.scan_tag_links(None, repair).await
    }

    async fn scan_tag_links(
        &self,
        scope: Option<(Uuid, &str)>,
        repair: bool,
    ) -> ResultEngine<Vec<OrphanedTagLink>> {
        with_tx!(self, |db_tx| {
            if let Some((version_id, user_id)) = scope {
                self.require_version_owned(&db_tx, version_id, user_id)
                    .await?;
            }

            let backend = self.database.get_database_backend();
            let stmt = match scope {
                Some((version_id, user_id)) => Statement::from_sql_and_values(
                    backend,
                    format!("{ORPHAN_SCAN} AND e.user_id = ? AND e.version_id = ?;"),
                    vec![user_id.into(), version_id.to_string().into()],
                ),
                None => Statement::from_sql_and_values(backend, format!("{ORPHAN_SCAN};"), vec![]),
            };

            let rows = db_tx.query_all(stmt).await?;
            let mut orphans = Vec::with_capacity(rows.len());
            for row in rows {
                orphans.push(OrphanedTagLink {
                    expense_id: row.try_get("", "expense_id")?,
                    tag_id: row.try_get("", "tag_id")?,
                    version_id: row.try_get("", "version_id")?,
                    user_id: row.try_get("", "user_id")?,
                });
            }

            if repair && !orphans.is_empty() {
                for orphan in &orphans {
                    db_tx
                        .execute(Statement::from_sql_and_values(
                            backend,
                            "DELETE FROM expense_tags WHERE expense_id = ? AND tag_id = ?;",
                            vec![
                                orphan.expense_id.clone().into(),
                                orphan.tag_id.clone().into(),
                            ],
                        ))
                        .await?;
                }
                tracing::info!(
                    removed = orphans.len(),
                    "removed orphaned expense/tag links"
                );
            }

            Ok(orphans)
        })
    }
}
