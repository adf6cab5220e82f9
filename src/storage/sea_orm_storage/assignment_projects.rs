//! 作业项目存储操作

use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::assignment_projects::{ActiveModel, Column, Entity as AssignmentProjects, Relation};
use crate::entity::assignments::{Column as AssignmentColumn, Entity as Assignments};
use crate::entity::teams::{Column as TeamColumn, Entity as Teams};
use crate::errors::{GitClassroomsError, Result};
use crate::gitlab::TestReportSummary;
use crate::models::projects::entities::{AssignmentProject, ProjectStatus};

impl SeaOrmStorage {
    /// 为一组团队创建 Pending 项目
    ///
    /// 所有团队必须属于作业所在的课堂；已经有项目的团队被跳过，返回新建的项目。
    pub async fn create_assignment_projects_impl(
        &self,
        assignment_id: Uuid,
        team_ids: &[Uuid],
    ) -> Result<Vec<AssignmentProject>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        let assignment = Assignments::find_by_id(assignment_id)
            .one(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业失败: {e}")))?
            .ok_or_else(|| GitClassroomsError::not_found(format!("assignment {assignment_id}")))?;

        let requested: HashSet<Uuid> = team_ids.iter().copied().collect();
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let teams = Teams::find()
            .filter(TeamColumn::Id.is_in(requested.iter().copied()))
            .filter(TeamColumn::ClassroomId.eq(assignment.classroom_id))
            .all(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队失败: {e}")))?;
        if teams.len() != requested.len() {
            return Err(GitClassroomsError::validation(
                "all teams must belong to the assignment's classroom",
            ));
        }

        let existing: HashSet<Uuid> = AssignmentProjects::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .all(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业项目失败: {e}")))?
            .into_iter()
            .map(|p| p.team_id)
            .collect();

        let now = chrono::Utc::now().timestamp();
        let mut created = Vec::new();
        for team in teams.into_iter().filter(|t| !existing.contains(&t.id)) {
            let model = ActiveModel {
                id: Set(Uuid::new_v4()),
                assignment_id: Set(assignment_id),
                team_id: Set(team.id),
                project_status: Set(ProjectStatus::Pending.to_string()),
                gitlab_project_id: Set(None),
                gitlab_web_url: Set(None),
                junit_test_result: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("创建作业项目失败: {e}")))?;
            created.push(model.into_assignment_project());
        }

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    /// 在课堂范围内按ID查找项目
    pub async fn get_assignment_project_impl(
        &self,
        classroom_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<AssignmentProject>> {
        let result = AssignmentProjects::find_by_id(project_id)
            .join(JoinType::InnerJoin, Relation::Assignment.def())
            .filter(AssignmentColumn::ClassroomId.eq(classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业项目失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment_project()))
    }

    pub async fn get_assignment_project_by_team_impl(
        &self,
        assignment_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<AssignmentProject>> {
        let result = AssignmentProjects::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::TeamId.eq(team_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业项目失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment_project()))
    }

    pub async fn list_assignment_projects_impl(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<AssignmentProject>> {
        let result = AssignmentProjects::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业项目失败: {e}")))?;

        Ok(result
            .into_iter()
            .map(|m| m.into_assignment_project())
            .collect())
    }

    /// 课堂内所有已接受（已 fork）的项目
    pub async fn list_accepted_projects_by_classroom_impl(
        &self,
        classroom_id: Uuid,
    ) -> Result<Vec<AssignmentProject>> {
        let result = AssignmentProjects::find()
            .join(JoinType::InnerJoin, Relation::Assignment.def())
            .filter(AssignmentColumn::ClassroomId.eq(classroom_id))
            .filter(Column::ProjectStatus.eq(ProjectStatus::Accepted.to_string()))
            .filter(Column::GitlabProjectId.is_not_null())
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询已接受项目失败: {e}")))?;

        Ok(result
            .into_iter()
            .map(|m| m.into_assignment_project())
            .collect())
    }

    /// 团队内所有已接受的项目；`open_only` 时排除已关闭作业下的项目
    pub async fn list_accepted_projects_by_team_impl(
        &self,
        team_id: Uuid,
        open_only: bool,
    ) -> Result<Vec<AssignmentProject>> {
        let mut query = AssignmentProjects::find()
            .join(JoinType::InnerJoin, Relation::Assignment.def())
            .filter(Column::TeamId.eq(team_id))
            .filter(Column::ProjectStatus.eq(ProjectStatus::Accepted.to_string()))
            .filter(Column::GitlabProjectId.is_not_null());
        if open_only {
            query = query.filter(AssignmentColumn::Closed.eq(false));
        }

        let result = query
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询团队项目失败: {e}")))?;

        Ok(result
            .into_iter()
            .map(|m| m.into_assignment_project())
            .collect())
    }

    /// Pending → Creating 的条件更新，只有一个请求能抢到
    pub async fn claim_pending_project_impl(&self, project_id: Uuid) -> Result<bool> {
        let result = AssignmentProjects::update_many()
            .col_expr(
                Column::ProjectStatus,
                Expr::value(ProjectStatus::Creating.to_string()),
            )
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(project_id))
            .filter(Column::ProjectStatus.eq(ProjectStatus::Pending.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("锁定项目失败: {e}")))?;

        Ok(result.rows_affected == 1)
    }

    pub async fn update_project_status_impl(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
        gitlab_project_id: Option<i64>,
        gitlab_web_url: Option<String>,
    ) -> Result<Option<AssignmentProject>> {
        let Some(existing) = AssignmentProjects::find_by_id(project_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询作业项目失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.project_status = Set(status.to_string());
        if gitlab_project_id.is_some() {
            model.gitlab_project_id = Set(gitlab_project_id);
        }
        if gitlab_web_url.is_some() {
            model.gitlab_web_url = Set(gitlab_web_url);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新项目状态失败: {e}")))?;

        Ok(Some(result.into_assignment_project()))
    }

    pub async fn update_junit_result_impl(
        &self,
        project_id: Uuid,
        summary: &TestReportSummary,
    ) -> Result<bool> {
        let raw = serde_json::to_string(summary)?;

        let result = AssignmentProjects::update_many()
            .col_expr(Column::JunitTestResult, Expr::value(raw))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(project_id))
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("保存测试结果失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn assignment_has_accepted_projects_impl(&self, assignment_id: Uuid) -> Result<bool> {
        let count = AssignmentProjects::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::ProjectStatus.eq(ProjectStatus::Accepted.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询已接受项目失败: {e}")))?;

        Ok(count > 0)
    }

    pub async fn team_has_accepted_projects_impl(&self, team_id: Uuid) -> Result<bool> {
        let count = AssignmentProjects::find()
            .filter(Column::TeamId.eq(team_id))
            .filter(Column::ProjectStatus.eq(ProjectStatus::Accepted.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询已接受项目失败: {e}")))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::TestReportTotal;
    use crate::storage::sea_orm_storage::assignments::tests::new_assignment;
    use crate::storage::sea_orm_storage::classrooms::tests::new_classroom;
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage};

    #[tokio::test]
    async fn projects_only_for_teams_of_same_classroom() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let a = storage.create_classroom_impl(new_classroom(1, "A")).await.unwrap();
        let b = storage.create_classroom_impl(new_classroom(1, "B")).await.unwrap();
        let assignment = storage.create_assignment_impl(new_assignment(a.id, None)).await.unwrap();

        let own = storage.create_team_impl(a.id, "own", 1, "u").await.unwrap();
        let foreign = storage.create_team_impl(b.id, "foreign", 2, "u").await.unwrap();

        let err = storage
            .create_assignment_projects_impl(assignment.id, &[own.id, foreign.id])
            .await
            .unwrap_err();
        assert!(matches!(err, GitClassroomsError::Validation(_)));
        assert!(storage.list_assignment_projects_impl(assignment.id).await.unwrap().is_empty());

        let created = storage
            .create_assignment_projects_impl(assignment.id, &[own.id])
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].project_status, ProjectStatus::Pending);

        // 再次邀请同一团队不会重复创建
        let again = storage
            .create_assignment_projects_impl(assignment.id, &[own.id])
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn status_and_junit_updates() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let other = storage.create_classroom_impl(new_classroom(1, "D")).await.unwrap();
        let assignment = storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();
        let team = storage.create_team_impl(c.id, "t", 1, "u").await.unwrap();
        let project = storage
            .create_assignment_projects_impl(assignment.id, &[team.id])
            .await
            .unwrap()
            .remove(0);

        assert!(!storage.assignment_has_accepted_projects_impl(assignment.id).await.unwrap());
        assert!(storage.list_accepted_projects_by_classroom_impl(c.id).await.unwrap().is_empty());

        let accepted = storage
            .update_project_status_impl(
                project.id,
                ProjectStatus::Accepted,
                Some(900),
                Some("https://gitlab.test/c/t/lab".to_string()),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted.gitlab_project_id, Some(900));

        assert!(storage.assignment_has_accepted_projects_impl(assignment.id).await.unwrap());
        assert!(storage.team_has_accepted_projects_impl(team.id).await.unwrap());
        assert_eq!(
            storage.list_accepted_projects_by_classroom_impl(c.id).await.unwrap().len(),
            1
        );

        let summary = TestReportSummary {
            total: TestReportTotal {
                count: 4,
                success: 3,
                failed: 1,
                ..Default::default()
            },
            test_suites: vec![],
        };
        assert!(storage.update_junit_result_impl(project.id, &summary).await.unwrap());
        let loaded = storage
            .get_assignment_project_impl(c.id, project.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.junit_test_result, Some(summary));

        assert_eq!(
            storage.list_accepted_projects_by_team_impl(team.id, true).await.unwrap().len(),
            1
        );

        // 其他课堂范围内查不到
        assert!(storage.get_assignment_project_impl(other.id, project.id).await.unwrap().is_none());
        assert!(
            storage
                .get_assignment_project_by_team_impl(assignment.id, team.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn only_one_claim_wins_the_pending_project() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let assignment = storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();
        let team = storage.create_team_impl(c.id, "t", 1, "u").await.unwrap();
        let project = storage
            .create_assignment_projects_impl(assignment.id, &[team.id])
            .await
            .unwrap()
            .remove(0);

        assert!(storage.claim_pending_project_impl(project.id).await.unwrap());
        assert!(!storage.claim_pending_project_impl(project.id).await.unwrap());
        let loaded = storage
            .get_assignment_project_impl(c.id, project.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.project_status, ProjectStatus::Creating);

        // 退回 Pending 后可以重新抢占
        storage
            .update_project_status_impl(project.id, ProjectStatus::Pending, None, None)
            .await
            .unwrap();
        assert!(storage.claim_pending_project_impl(project.id).await.unwrap());
    }

    #[tokio::test]
    async fn team_projects_of_closed_assignments_are_filtered_when_asked() {
        let storage = memory_storage().await;
        storage.upsert_user_impl(gitlab_user(1, "owner")).await.unwrap();
        let c = storage.create_classroom_impl(new_classroom(1, "C")).await.unwrap();
        let open = storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();
        let closed = storage.create_assignment_impl(new_assignment(c.id, None)).await.unwrap();
        let team = storage.create_team_impl(c.id, "t", 1, "u").await.unwrap();
        for (assignment, gitlab_id) in [(&open, 900), (&closed, 901)] {
            let project = storage
                .create_assignment_projects_impl(assignment.id, &[team.id])
                .await
                .unwrap()
                .remove(0);
            storage
                .update_project_status_impl(project.id, ProjectStatus::Accepted, Some(gitlab_id), None)
                .await
                .unwrap();
        }
        storage.set_assignment_closed_impl(closed.id, true).await.unwrap();

        assert_eq!(
            storage.list_accepted_projects_by_team_impl(team.id, false).await.unwrap().len(),
            2
        );
        let open_only = storage.list_accepted_projects_by_team_impl(team.id, true).await.unwrap();
        assert_eq!(open_only.len(), 1);
        assert_eq!(open_only[0].gitlab_project_id, Some(900));
    }
}
