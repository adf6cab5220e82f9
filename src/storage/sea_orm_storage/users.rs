//! 用户存储操作

use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Entity as Users};
use crate::errors::{GitClassroomsError, Result};
use crate::models::users::{entities::User, requests::UpsertUserRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 按 GitLab 用户 ID 创建或更新用户
    pub async fn upsert_user_impl(&self, user: UpsertUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let existing = Users::find_by_id(user.id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询用户失败: {e}")))?;

        let result = match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.username = Set(user.username);
                active.email = Set(user.email);
                active.name = Set(user.name);
                active.avatar_url = Set(user.avatar_url);
                active.web_url = Set(user.web_url);
                active.updated_at = Set(now);
                active.update(&self.db).await.map_err(|e| {
                    GitClassroomsError::database_operation(format!("更新用户失败: {e}"))
                })?
            }
            None => ActiveModel {
                id: Set(user.id),
                username: Set(user.username),
                email: Set(user.email),
                name: Set(user.name),
                avatar_url: Set(user.avatar_url),
                web_url: Set(user.web_url),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("创建用户失败: {e}")))?,
        };

        Ok(result.into_user())
    }

    /// 通过ID获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{gitlab_user, memory_storage};

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let storage = memory_storage().await;

        let created = storage
            .upsert_user_impl(gitlab_user(42, "ada"))
            .await
            .expect("insert");
        assert_eq!(created.id, 42);
        assert_eq!(created.email, "ada@example.org");

        let mut changed = gitlab_user(42, "ada");
        changed.name = "Ada Lovelace".to_string();
        let updated = storage.upsert_user_impl(changed).await.expect("update");
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.created_at, created.created_at);

        let loaded = storage.get_user_by_id_impl(42).await.expect("query");
        assert_eq!(loaded.map(|u| u.name), Some("Ada Lovelace".to_string()));
        assert!(storage.get_user_by_id_impl(7).await.expect("query").is_none());
    }
}
