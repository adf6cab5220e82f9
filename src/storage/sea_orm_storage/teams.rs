//! 团队存储操作

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::teams::{ActiveModel, Column, Entity as Teams};
use crate::entity::user_classrooms::{Column as UserClassroomColumn, Entity as UserClassrooms};
use crate::entity::users::Entity as Users;
use crate::errors::{GitClassroomsError, Result};
use crate::models::{
    teams::entities::{Team, TeamWithMembers},
    user_classrooms::entities::ClassroomMember,
};

impl SeaOrmStorage {
    pub async fn create_team_impl(
        &self,
        classroom_id: Uuid,
        name: &str,
        group_id: i64,
        gitlab_web_url: &str,
    ) -> Result<Team> {
        let now = chrono::Utc::now().timestamp();

        let result = ActiveModel {
            id: Set(Uuid::new_v4()),
            classroom_id: Set(classroom_id),
            name: Set(name.to_string()),
            group_id: Set(group_id),
            gitlab_web_url: Set(gitlab_web_url.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("创建团队失败: {e}")))?;

        Ok(result.into_team())
    }

    pub async fn get_team_impl(&self, classroom_id: Uuid, team_id: Uuid) -> Result<Option<Team>> {
        let result = Teams::find_by_id(team_id)
            .filter(Column::ClassroomId.eq(classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队失败: {e}")))?;

        Ok(result.map(|m| m.into_team()))
    }

    /// 列出课堂的团队及成员
    pub async fn list_teams_impl(&self, classroom_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        let teams = Teams::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队列表失败: {e}")))?;

        let memberships = UserClassrooms::find()
            .filter(UserClassroomColumn::ClassroomId.eq(classroom_id))
            .filter(UserClassroomColumn::TeamId.is_not_null())
            .order_by_asc(UserClassroomColumn::CreatedAt)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队成员失败: {e}")))?;

        let mut by_team: HashMap<Uuid, Vec<ClassroomMember>> = HashMap::new();
        for (membership, user) in memberships {
            if let (Some(team_id), Some(user)) = (membership.team_id, user) {
                by_team
                    .entry(team_id)
                    .or_default()
                    .push(membership.into_member(user));
            }
        }

        Ok(teams
            .into_iter()
            .map(|model| {
                let members = by_team.remove(&model.id).unwrap_or_default();
                TeamWithMembers {
                    team: model.into_team(),
                    members,
                }
            })
            .collect())
    }

    pub async fn count_teams_impl(&self, classroom_id: Uuid) -> Result<u64> {
        Teams::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .count(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队数量失败: {e}")))
    }

    pub async fn count_team_members_impl(&self, team_id: Uuid) -> Result<u64> {
        UserClassrooms::find()
            .filter(UserClassroomColumn::TeamId.eq(team_id))
            .count(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队人数失败: {e}")))
    }

    pub async fn list_team_members_impl(&self, team_id: Uuid) -> Result<Vec<ClassroomMember>> {
        let rows = UserClassrooms::find()
            .filter(UserClassroomColumn::TeamId.eq(team_id))
            .order_by_asc(UserClassroomColumn::CreatedAt)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队成员失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| user.map(|u| membership.into_member(u)))
            .collect())
    }

    pub async fn rename_team_impl(&self, team_id: Uuid, name: &str) -> Result<Option<Team>> {
        let Some(existing) = Teams::find_by_id(team_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.name = Set(name.to_string());
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("重命名团队失败: {e}")))?;

        Ok(Some(result.into_team()))
    }

    /// 删除团队，成员的 team_id 随外键置空
    pub async fn delete_team_impl(&self, team_id: Uuid) -> Result<bool> {
        let result = Teams::delete_by_id(team_id)
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("删除团队失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::user_classrooms::entities::Role;
    use crate::storage::sea_orm_storage::classrooms::tests::new_classroom;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};

    #[tokio::test]
    async fn teams_with_members_and_counts() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "ann")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(3, "bob")).await.unwrap();

        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        storage.add_member_impl(c.id, 2, Role::Student).await.unwrap();
        storage.add_member_impl(c.id, 3, Role::Student).await.unwrap();

        let alpha = storage.create_team_impl(c.id, "alpha", 11, "u1").await.unwrap();
        let beta = storage.create_team_impl(c.id, "beta", 12, "u2").await.unwrap();
        storage.update_member_team_impl(c.id, 2, Some(alpha.id)).await.unwrap();
        storage.update_member_team_impl(c.id, 3, Some(alpha.id)).await.unwrap();

        assert_eq!(storage.count_teams_impl(c.id).await.unwrap(), 2);
        assert_eq!(storage.count_team_members_impl(alpha.id).await.unwrap(), 2);
        assert_eq!(storage.count_team_members_impl(beta.id).await.unwrap(), 0);

        let teams = storage.list_teams_impl(c.id).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team.name, "alpha");
        assert_eq!(teams[0].members.len(), 2);
        assert!(teams[1].members.is_empty());

        let renamed = storage.rename_team_impl(beta.id, "gamma").await.unwrap().unwrap();
        assert_eq!(renamed.name, "gamma");

        // 删除团队后成员仍在课堂中，但不再属于任何团队
        assert!(storage.delete_team_impl(alpha.id).await.unwrap());
        let ann = storage.get_membership_impl(c.id, 2).await.unwrap().unwrap();
        assert_eq!(ann.team_id, None);
    }
}
