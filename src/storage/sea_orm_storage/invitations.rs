//! 课堂邀请存储操作

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::classroom_invitations::{
    ActiveModel, Column, Entity as ClassroomInvitations,
};
use crate::entity::user_classrooms::{
    ActiveModel as UserClassroomActiveModel, Entity as UserClassrooms,
};
use crate::errors::{GitClassroomsError, Result};
use crate::models::{
    invitations::entities::{ClassroomInvitation, InvitationStatus},
    user_classrooms::entities::{Role, UserClassroom},
};

impl SeaOrmStorage {
    pub async fn create_invitations_impl(
        &self,
        classroom_id: Uuid,
        emails: &[String],
        expiry_date: DateTime<Utc>,
    ) -> Result<Vec<ClassroomInvitation>> {
        let now = Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        let mut created = Vec::with_capacity(emails.len());
        for email in emails {
            let model = ActiveModel {
                id: Set(Uuid::new_v4()),
                classroom_id: Set(classroom_id),
                email: Set(email.clone()),
                status: Set(InvitationStatus::Pending.to_string()),
                expiry_date: Set(expiry_date.timestamp()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("创建邀请失败: {e}")))?;
            created.push(model.into_invitation());
        }

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    pub async fn get_invitation_impl(
        &self,
        invitation_id: Uuid,
    ) -> Result<Option<ClassroomInvitation>> {
        let result = ClassroomInvitations::find_by_id(invitation_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询邀请失败: {e}")))?;

        Ok(result.map(|m| m.into_invitation()))
    }

    pub async fn list_invitations_impl(
        &self,
        classroom_id: Uuid,
    ) -> Result<Vec<ClassroomInvitation>> {
        let result = ClassroomInvitations::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询邀请列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_invitation()).collect())
    }

    pub async fn update_invitation_status_impl(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
    ) -> Result<Option<ClassroomInvitation>> {
        let Some(existing) = ClassroomInvitations::find_by_id(invitation_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询邀请失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新邀请状态失败: {e}")))?;

        Ok(Some(result.into_invitation()))
    }

    /// 接受邀请：邀请置为 accepted，并以学生身份加入课堂
    ///
    /// 只接受仍为 pending 且未过期的邀请，否则返回 `Validation`。已经是成员的用户保留原有角色。
    pub async fn accept_invitation_impl(
        &self,
        invitation_id: Uuid,
        user_id: i64,
    ) -> Result<UserClassroom> {
        let now = Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        let invitation = ClassroomInvitations::find_by_id(invitation_id)
            .one(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询邀请失败: {e}")))?
            .ok_or_else(|| GitClassroomsError::not_found(format!("invitation {invitation_id}")))?;
        let classroom_id = invitation.classroom_id;
        if let Err((_, message)) = invitation.into_invitation().check_answerable(Utc::now()) {
            return Err(GitClassroomsError::validation(message));
        }

        // 条件更新，检查之后被撤销或过期的邀请不会被接受
        let updated = ClassroomInvitations::update_many()
            .col_expr(
                Column::Status,
                Expr::value(InvitationStatus::Accepted.to_string()),
            )
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(invitation_id))
            .filter(Column::Status.eq(InvitationStatus::Pending.to_string()))
            .filter(Column::ExpiryDate.gt(now))
            .exec(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新邀请状态失败: {e}")))?;
        if updated.rows_affected != 1 {
            return Err(GitClassroomsError::validation("invitation is no longer pending"));
        }

        let existing = UserClassrooms::find_by_id((user_id, classroom_id))
            .one(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询成员关系失败: {e}")))?;

        let membership = match existing {
            Some(m) => m,
            None => UserClassroomActiveModel {
                user_id: Set(user_id),
                classroom_id: Set(classroom_id),
                role: Set(Role::Student.to_string()),
                team_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("加入课堂失败: {e}")))?,
        };

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(membership.into_user_classroom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::classrooms::tests::new_classroom;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};
    use chrono::Duration;

    #[tokio::test]
    async fn accept_adds_student_membership() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "student")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();

        let expiry = Utc::now() + Duration::days(14);
        let invitations = storage
            .create_invitations_impl(
                c.id,
                &["student@example.org".to_string(), "other@example.org".to_string()],
                expiry,
            )
            .await
            .unwrap();
        assert_eq!(invitations.len(), 2);
        assert!(invitations.iter().all(|i| i.status == InvitationStatus::Pending));

        let membership = storage
            .accept_invitation_impl(invitations[0].id, 2)
            .await
            .unwrap();
        assert_eq!(membership.role, Role::Student);
        assert_eq!(membership.classroom_id, c.id);

        let accepted = storage.get_invitation_impl(invitations[0].id).await.unwrap().unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);

        let revoked = storage
            .update_invitation_status_impl(invitations[1].id, InvitationStatus::Revoked)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
        assert_eq!(storage.list_invitations_impl(c.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn accept_keeps_existing_role() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let invitation = storage
            .create_invitations_impl(
                c.id,
                &["owner@example.org".to_string()],
                Utc::now() + Duration::days(1),
            )
            .await
            .unwrap()
            .remove(0);

        let membership = storage.accept_invitation_impl(invitation.id, 1).await.unwrap();
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn revoked_or_expired_invitations_cannot_be_accepted() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        storage.upsert_user_impl(gitlab_user(2, "student")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let revoked = storage
            .create_invitations_impl(
                c.id,
                &["student@example.org".to_string()],
                Utc::now() + Duration::days(1),
            )
            .await
            .unwrap()
            .remove(0);
        let expired = storage
            .create_invitations_impl(
                c.id,
                &["student@example.org".to_string()],
                Utc::now() - Duration::minutes(1),
            )
            .await
            .unwrap()
            .remove(0);
        storage
            .update_invitation_status_impl(revoked.id, InvitationStatus::Revoked)
            .await
            .unwrap();

        for id in [revoked.id, expired.id] {
            let err = storage.accept_invitation_impl(id, 2).await.unwrap_err();
            assert!(matches!(err, GitClassroomsError::Validation(_)));
        }
        assert!(storage.get_membership_impl(c.id, 2).await.unwrap().is_none());
        let stored = storage.get_invitation_impl(revoked.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Revoked);
    }
}
