//! 课堂成员关系存储操作

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::teams::{Column as TeamColumn, Entity as Teams};
use crate::entity::user_classrooms::{ActiveModel, Column, Entity as UserClassrooms};
use crate::entity::users::Entity as Users;
use crate::errors::{GitClassroomsError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    user_classrooms::entities::{ClassroomMember, Role, UserClassroom},
};

impl SeaOrmStorage {
    pub async fn get_membership_impl(
        &self,
        classroom_id: Uuid,
        user_id: i64,
    ) -> Result<Option<UserClassroom>> {
        let result = UserClassrooms::find_by_id((user_id, classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员关系失败: {e}")))?;

        Ok(result.map(|m| m.into_user_classroom()))
    }

    /// 带用户资料的单个成员
    pub async fn get_member_impl(
        &self,
        classroom_id: Uuid,
        user_id: i64,
    ) -> Result<Option<ClassroomMember>> {
        let result = UserClassrooms::find_by_id((user_id, classroom_id))
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员失败: {e}")))?;

        Ok(result.and_then(|(membership, user)| user.map(|u| membership.into_member(u))))
    }

    /// 分页列出课堂成员
    pub async fn list_members_impl(
        &self,
        classroom_id: Uuid,
        role: Option<Role>,
        page: u64,
        size: u64,
    ) -> Result<PaginatedResponse<ClassroomMember>> {
        let page = page.max(1);
        let size = size.clamp(1, 100);

        let mut select = UserClassrooms::find().filter(Column::ClassroomId.eq(classroom_id));
        if let Some(role) = role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        let paginator = select
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::UserId)
            .find_also_related(Users)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员总数失败: {e}")))?;
        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员列表失败: {e}")))?;

        Ok(PaginatedResponse {
            items: rows
                .into_iter()
                .filter_map(|(membership, user)| user.map(|u| membership.into_member(u)))
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 课堂全部成员（报表、归档等批量操作使用）
    pub async fn list_all_members_impl(&self, classroom_id: Uuid) -> Result<Vec<ClassroomMember>> {
        let rows = UserClassrooms::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_asc(Column::CreatedAt)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员列表失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| user.map(|u| membership.into_member(u)))
            .collect())
    }

    pub async fn add_member_impl(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<UserClassroom> {
        let now = chrono::Utc::now().timestamp();

        let result = ActiveModel {
            user_id: Set(user_id),
            classroom_id: Set(classroom_id),
            role: Set(role.to_string()),
            team_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("添加成员失败: {e}")))?;

        Ok(result.into_user_classroom())
    }

    pub async fn update_member_role_impl(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<Option<UserClassroom>> {
        let Some(existing) = UserClassrooms::find_by_id((user_id, classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员关系失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.role = Set(role.to_string());
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新成员角色失败: {e}")))?;

        Ok(Some(result.into_user_classroom()))
    }

    /// 设置或清除成员的团队，团队必须属于同一课堂
    pub async fn update_member_team_impl(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        team_id: Option<Uuid>,
    ) -> Result<Option<UserClassroom>> {
        if let Some(team_id) = team_id {
            let team = Teams::find_by_id(team_id)
                .filter(TeamColumn::ClassroomId.eq(classroom_id))
                .one(&self.db)
                .await
                .map_err(|e| GitClassroomsError::database_operation(format!("查询团队失败: {e}")))?;
            if team.is_none() {
                return Err(GitClassroomsError::validation(format!(
                    "team {team_id} does not belong to classroom {classroom_id}"
                )));
            }
        }

        let Some(existing) = UserClassrooms::find_by_id((user_id, classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员关系失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.team_id = Set(team_id);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新成员团队失败: {e}")))?;

        Ok(Some(result.into_user_classroom()))
    }

    pub async fn remove_member_impl(&self, classroom_id: Uuid, user_id: i64) -> Result<bool> {
        let result = UserClassrooms::delete_by_id((user_id, classroom_id))
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("移除成员失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::classrooms::tests::new_classroom;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};

    #[tokio::test]
    async fn team_must_belong_to_same_classroom() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "student")).await.unwrap();

        let a = storage.create_classroom_impl(new_classroom(1, "A")).await.unwrap();
        let b = storage.create_classroom_impl(new_classroom(1, "B")).await.unwrap();
        storage.add_member_impl(a.id, 2, Role::Student).await.unwrap();

        let foreign_team = storage
            .create_team_impl(b.id, "other", 77, "https://gitlab.test/b/other")
            .await
            .unwrap();
        let err = storage
            .update_member_team_impl(a.id, 2, Some(foreign_team.id))
            .await
            .unwrap_err();
        assert!(matches!(err, GitClassroomsError::Validation(_)));

        let own_team = storage
            .create_team_impl(a.id, "mine", 78, "https://gitlab.test/a/mine")
            .await
            .unwrap();
        let updated = storage
            .update_member_team_impl(a.id, 2, Some(own_team.id))
            .await
            .unwrap()
            .expect("membership");
        assert_eq!(updated.team_id, Some(own_team.id));

        let cleared = storage
            .update_member_team_impl(a.id, 2, None)
            .await
            .unwrap()
            .expect("membership");
        assert_eq!(cleared.team_id, None);
    }

    #[tokio::test]
    async fn list_and_role_changes() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "ta")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(3, "student")).await.unwrap();

        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        storage.add_member_impl(c.id, 2, Role::Student).await.unwrap();
        storage.add_member_impl(c.id, 3, Role::Student).await.unwrap();

        let promoted = storage
            .update_member_role_impl(c.id, 2, Role::Moderator)
            .await
            .unwrap()
            .expect("membership");
        assert_eq!(promoted.role, Role::Moderator);

        let students = storage
            .list_members_impl(c.id, Some(Role::Student), 1, 10)
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 1);
        assert_eq!(students.items[0].user.username, "student");

        assert_eq!(storage.list_all_members_impl(c.id).await.unwrap().len(), 3);

        assert!(storage.remove_member_impl(c.id, 3).await.unwrap());
        assert!(storage.get_member_impl(c.id, 3).await.unwrap().is_none());
        assert!(
            storage
                .update_member_role_impl(c.id, 3, Role::Student)
                .await
                .unwrap()
                .is_none()
        );
    }
}
