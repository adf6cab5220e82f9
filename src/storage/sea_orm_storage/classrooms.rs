//! 课堂存储操作

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::classrooms::{ActiveModel, Column, Entity as Classrooms, Relation};
use crate::entity::user_classrooms::{
    ActiveModel as UserClassroomActiveModel, Column as UserClassroomColumn,
    Entity as UserClassrooms,
};
use crate::errors::{GitClassroomsError, Result};
use crate::models::{
    PaginationInfo,
    classrooms::{
        entities::Classroom,
        requests::{ClassroomListFilter, NewClassroom},
        responses::{ClassroomListResponse, UserClassroomResponse},
    },
    user_classrooms::entities::Role,
};

impl SeaOrmStorage {
    /// 创建课堂并写入创建者的 Owner 成员关系
    pub async fn create_classroom_impl(&self, classroom: NewClassroom) -> Result<Classroom> {
        let now = Utc::now().timestamp();
        let owner_id = classroom.owner_id;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(classroom.name),
            description: Set(classroom.description),
            owner_id: Set(owner_id),
            gitlab_group_id: Set(classroom.gitlab_group_id),
            gitlab_web_url: Set(classroom.gitlab_web_url),
            group_access_token_id: Set(classroom.group_access_token_id),
            group_access_token: Set(classroom.group_access_token),
            group_access_token_created_at: Set(now),
            archived: Set(false),
            create_teams: Set(classroom.create_teams),
            max_team_size: Set(classroom.max_team_size),
            max_teams: Set(classroom.max_teams),
            students_view_all_projects: Set(classroom.students_view_all_projects),
            potentially_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("创建课堂失败: {e}")))?;

        UserClassroomActiveModel {
            user_id: Set(owner_id),
            classroom_id: Set(model.id),
            role: Set(Role::Owner.to_string()),
            team_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("写入课堂创建者失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(model.into_classroom())
    }

    /// 通过ID获取课堂
    pub async fn get_classroom_by_id_impl(&self, classroom_id: Uuid) -> Result<Option<Classroom>> {
        let result = Classrooms::find_by_id(classroom_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂失败: {e}")))?;

        Ok(result.map(|m| m.into_classroom()))
    }

    /// 分页列出用户加入的课堂
    pub async fn list_user_classrooms_impl(
        &self,
        user_id: i64,
        filter: ClassroomListFilter,
    ) -> Result<ClassroomListResponse> {
        let page = filter.page.max(1);
        let size = filter.size.clamp(1, 100);

        let mut select = Classrooms::find()
            .join(JoinType::InnerJoin, Relation::UserClassrooms.def())
            .filter(UserClassroomColumn::UserId.eq(user_id));

        if let Some(role) = filter.role {
            select = select.filter(UserClassroomColumn::Role.eq(role.to_string()));
        }
        if let Some(archived) = filter.archived {
            select = select.filter(Column::Archived.eq(archived));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂总数失败: {e}")))?;
        let classrooms = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂列表失败: {e}")))?;

        // 补充调用者在每个课堂中的角色和团队
        let ids: Vec<Uuid> = classrooms.iter().map(|c| c.id).collect();
        let memberships: HashMap<Uuid, (Role, Option<Uuid>)> = if ids.is_empty() {
            HashMap::new()
        } else {
            UserClassrooms::find()
                .filter(UserClassroomColumn::UserId.eq(user_id))
                .filter(UserClassroomColumn::ClassroomId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(|e| {
                    GitClassroomsError::database_operation(format!("查询课堂成员关系失败: {e}"))
                })?
                .into_iter()
                .map(|m| {
                    let membership = m.into_user_classroom();
                    (
                        membership.classroom_id,
                        (membership.role, membership.team_id),
                    )
                })
                .collect()
        };

        let items = classrooms
            .into_iter()
            .map(|model| {
                let (role, team_id) = memberships
                    .get(&model.id)
                    .copied()
                    .unwrap_or((Role::Student, None));
                UserClassroomResponse {
                    classroom: model.into_classroom(),
                    role,
                    team_id,
                }
            })
            .collect();

        Ok(ClassroomListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 分页列出用户创建的课堂
    pub async fn list_owned_classrooms_impl(
        &self,
        owner_id: i64,
        page: u64,
        size: u64,
    ) -> Result<ClassroomListResponse> {
        let page = page.max(1);
        let size = size.clamp(1, 100);

        let paginator = Classrooms::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂总数失败: {e}")))?;
        let classrooms = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂列表失败: {e}")))?;

        Ok(ClassroomListResponse {
            items: classrooms
                .into_iter()
                .map(|m| UserClassroomResponse {
                    classroom: m.into_classroom(),
                    role: Role::Owner,
                    team_id: None,
                })
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新名称和描述
    pub async fn update_classroom_impl(
        &self,
        classroom_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Classroom>> {
        let Some(existing) = Classrooms::find_by_id(classroom_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.name = Set(name.to_string());
        model.description = Set(description.to_string());
        model.updated_at = Set(Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新课堂失败: {e}")))?;

        Ok(Some(result.into_classroom()))
    }

    pub async fn set_classroom_archived_impl(
        &self,
        classroom_id: Uuid,
        archived: bool,
    ) -> Result<bool> {
        let result = Classrooms::update_many()
            .col_expr(Column::Archived, Expr::value(archived))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(Column::Id.eq(classroom_id))
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新归档状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_classroom_potentially_deleted_impl(
        &self,
        classroom_id: Uuid,
        potentially_deleted: bool,
    ) -> Result<bool> {
        let result = Classrooms::update_many()
            .col_expr(Column::PotentiallyDeleted, Expr::value(potentially_deleted))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(Column::Id.eq(classroom_id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                GitClassroomsError::database_operation(format!("更新课堂删除标记失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 保存轮换后的组访问令牌
    pub async fn update_classroom_token_impl(
        &self,
        classroom_id: Uuid,
        token_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Classroom>> {
        let Some(existing) = Classrooms::find_by_id(classroom_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询课堂失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.group_access_token_id = Set(token_id);
        model.group_access_token = Set(token.to_string());
        model.group_access_token_created_at = Set(created_at.timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("保存访问令牌失败: {e}")))?;

        Ok(Some(result.into_classroom()))
    }

    /// 删除课堂，成员、团队、作业等随外键级联删除
    pub async fn delete_classroom_impl(&self, classroom_id: Uuid) -> Result<bool> {
        let result = Classrooms::delete_by_id(classroom_id)
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("删除课堂失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};

    pub(crate) fn new_classroom(owner_id: i64, name: &str) -> NewClassroom {
        NewClassroom {
            name: name.to_string(),
            description: "course".to_string(),
            owner_id,
            gitlab_group_id: 100,
            gitlab_web_url: "https://gitlab.test/groups/course".to_string(),
            group_access_token_id: 5,
            group_access_token: "glpat-initial".to_string(),
            create_teams: true,
            max_team_size: 2,
            max_teams: 0,
            students_view_all_projects: false,
        }
    }

    #[tokio::test]
    async fn create_inserts_owner_membership() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();

        let classroom = storage
            .create_classroom_impl(new_classroom(1, "SE"))
            .await
            .unwrap();
        assert_eq!(classroom.group_access_token, "glpat-initial");
        assert!(!classroom.archived);

        let membership = storage
            .get_membership_impl(classroom.id, 1)
            .await
            .unwrap()
            .expect("owner membership");
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn list_filters_by_role_and_archived() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "student")).await.unwrap();

        let a = storage.create_classroom_impl(new_classroom(1, "A")).await.unwrap();
        let b = storage.create_classroom_impl(new_classroom(2, "B")).await.unwrap();
        storage.add_member_impl(a.id, 2, Role::Student).await.unwrap();
        storage.set_classroom_archived_impl(a.id, true).await.unwrap();

        let all = storage
            .list_user_classrooms_impl(
                2,
                ClassroomListFilter {
                    page: 1,
                    size: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let students = storage
            .list_user_classrooms_impl(
                2,
                ClassroomListFilter {
                    page: 1,
                    size: 10,
                    role: Some(Role::Student),
                    archived: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(students.items.len(), 1);
        assert_eq!(students.items[0].classroom.id, a.id);
        assert_eq!(students.items[0].role, Role::Student);

        let active = storage
            .list_user_classrooms_impl(
                2,
                ClassroomListFilter {
                    page: 1,
                    size: 10,
                    role: None,
                    archived: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(active.items.len(), 1);
        assert_eq!(active.items[0].classroom.id, b.id);
        assert_eq!(active.items[0].role, Role::Owner);

        let owned = storage.list_owned_classrooms_impl(1, 1, 10).await.unwrap();
        assert_eq!(owned.items.len(), 1);
    }

    #[tokio::test]
    async fn token_update_and_delete() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let classroom = storage.create_classroom_impl(new_classroom(1, "SE")).await.unwrap();

        let rotated_at = Utc::now() + chrono::Duration::hours(1);
        let updated = storage
            .update_classroom_token_impl(classroom.id, 9, "glpat-rotated", rotated_at)
            .await
            .unwrap()
            .expect("classroom");
        assert_eq!(updated.group_access_token_id, 9);
        assert_eq!(updated.group_access_token, "glpat-rotated");
        assert_eq!(
            updated.group_access_token_created_at.timestamp(),
            rotated_at.timestamp()
        );

        assert!(storage.delete_classroom_impl(classroom.id).await.unwrap());
        assert!(storage.get_membership_impl(classroom.id, 1).await.unwrap().is_none());
        assert!(!storage.delete_classroom_impl(classroom.id).await.unwrap());
    }
}
