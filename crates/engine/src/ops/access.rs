use sea_orm::{DatabaseTransaction, PaginatorTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, users, versions};

use super::Engine;

impl Engine {
    pub(super) async fn find_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        self.find_user(db, username).await.map(|_| ())
    }

    /// A version owned by someone else reports the same error as a missing
    /// one.
    pub(super) async fn require_version_owned(
        &self,
        db: &DatabaseTransaction,
        version_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<versions::Model> {
        let model = versions::Entity::find_by_id(version_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("version not exists".to_string()))?;
        if model.user_id != user_id {
            return Err(EngineError::KeyNotFound("version not exists".to_string()));
        }
        Ok(model)
    }

    pub(super) async fn count_user_versions(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<u64> {
        versions::Entity::find()
            .filter(versions::Column::UserId.eq(user_id.to_string()))
            .count(db)
            .await
            .map_err(Into::into)
    }
}
