//! 作业存储操作

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::assignment_rubrics::{
    ActiveModel as AssignmentRubricActiveModel, Column as AssignmentRubricColumn,
    Entity as AssignmentRubrics,
};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::manual_grading_rubrics::{
    Column as RubricColumn, Entity as ManualGradingRubrics, Relation as RubricRelation,
};
use crate::errors::{GitClassroomsError, Result};
use crate::models::{
    assignments::{
        entities::Assignment,
        requests::{NewAssignment, UpdateAssignmentRequest},
    },
    grading::entities::ManualGradingRubric,
};

impl SeaOrmStorage {
    pub async fn create_assignment_impl(&self, assignment: NewAssignment) -> Result<Assignment> {
        let now = Utc::now().timestamp();

        let result = ActiveModel {
            id: Set(Uuid::new_v4()),
            classroom_id: Set(assignment.classroom_id),
            template_project_id: Set(assignment.template_project_id),
            name: Set(assignment.name),
            description: Set(assignment.description),
            due_date: Set(assignment.due_date.map(|d| d.timestamp())),
            closed: Set(false),
            enable_junit_grading: Set(assignment.enable_junit_grading),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    pub async fn get_assignment_impl(
        &self,
        classroom_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .filter(Column::ClassroomId.eq(classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn list_assignments_impl(&self, classroom_id: Uuid) -> Result<Vec<Assignment>> {
        let result = Assignments::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 只更新请求中出现的字段
    pub async fn update_assignment_impl(
        &self,
        assignment_id: Uuid,
        update: &UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        let Some(existing) = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(description) = &update.description {
            model.description = Set(description.clone());
        }
        if let Some(due_date) = update.due_date {
            model.due_date = Set(Some(due_date.timestamp()));
        }
        if let Some(enable) = update.enable_junit_grading {
            model.enable_junit_grading = Set(enable);
        }
        model.updated_at = Set(Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新作业失败: {e}")))?;

        Ok(Some(result.into_assignment()))
    }

    pub async fn set_assignment_closed_impl(&self, assignment_id: Uuid, closed: bool) -> Result<bool> {
        let result = Assignments::update_many()
            .col_expr(Column::Closed, Expr::value(closed))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(Column::Id.eq(assignment_id))
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新作业关闭状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 截止时间已过但仍开放的作业
    pub async fn list_due_open_assignments_impl(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>> {
        let result = Assignments::find()
            .filter(Column::Closed.eq(false))
            .filter(Column::DueDate.is_not_null())
            .filter(Column::DueDate.lte(now.timestamp()))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询到期作业失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 替换作业挂载的评分细则
    pub async fn set_assignment_rubrics_impl(
        &self,
        assignment_id: Uuid,
        rubric_ids: &[Uuid],
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        AssignmentRubrics::delete_many()
            .filter(AssignmentRubricColumn::AssignmentId.eq(assignment_id))
            .exec(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("清除作业细则失败: {e}")))?;

        let mut ids = rubric_ids.to_vec();
        ids.sort();
        ids.dedup();
        if !ids.is_empty() {
            AssignmentRubrics::insert_many(ids.into_iter().map(|rubric_id| {
                AssignmentRubricActiveModel {
                    assignment_id: Set(assignment_id),
                    rubric_id: Set(rubric_id),
                }
            }))
            .exec(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("写入作业细则失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }

    pub async fn list_assignment_rubrics_impl(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<ManualGradingRubric>> {
        let result = ManualGradingRubrics::find()
            .join(JoinType::InnerJoin, RubricRelation::AssignmentRubrics.def())
            .filter(AssignmentRubricColumn::AssignmentId.eq(assignment_id))
            .order_by_asc(RubricColumn::Name)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业细则失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_rubric()).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::grading::requests::RubricRequest;
    use crate::storage::sea_orm_storage::classrooms::tests::new_classroom;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};
    use chrono::Duration;

    pub(crate) fn new_assignment(classroom_id: Uuid, due_date: Option<DateTime<Utc>>) -> NewAssignment {
        NewAssignment {
            classroom_id,
            template_project_id: 500,
            name: "Lab 1".to_string(),
            description: "first lab".to_string(),
            due_date,
            enable_junit_grading: true,
        }
    }

    #[tokio::test]
    async fn due_open_assignments_only() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();

        let now = Utc::now();
        let past = storage
            .create_assignment_impl(new_assignment(c.id, Some(now - Duration::hours(1))))
            .await
            .unwrap();
        let closed = storage
            .create_assignment_impl(new_assignment(c.id, Some(now - Duration::hours(2))))
            .await
            .unwrap();
        storage.set_assignment_closed_impl(closed.id, true).await.unwrap();
        storage
            .create_assignment_impl(new_assignment(c.id, Some(now + Duration::days(1))))
            .await
            .unwrap();
        storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();

        let due = storage.list_due_open_assignments_impl(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, past.id);
        assert_eq!(storage.list_assignments_impl(c.id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn partial_update_and_rubric_set() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let a = storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();

        let updated = storage
            .update_assignment_impl(
                a.id,
                &UpdateAssignmentRequest {
                    name: Some("Lab 1b".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Lab 1b");
        assert_eq!(updated.description, "first lab");

        let rubric = |name: &str| RubricRequest {
            name: name.to_string(),
            description: String::new(),
            max_score: 10,
        };
        let style = storage.create_rubric_impl(c.id, &rubric("Style")).await.unwrap();
        let docs = storage.create_rubric_impl(c.id, &rubric("Docs")).await.unwrap();

        storage
            .set_assignment_rubrics_impl(a.id, &[style.id, docs.id, style.id])
            .await
            .unwrap();
        let names: Vec<String> = storage
            .list_assignment_rubrics_impl(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Docs", "Style"]);

        storage.set_assignment_rubrics_impl(a.id, &[docs.id]).await.unwrap();
        assert_eq!(storage.list_assignment_rubrics_impl(a.id).await.unwrap().len(), 1);
    }
}
