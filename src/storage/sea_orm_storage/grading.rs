//! 评分细则与评分结果存储操作

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::SeaOrmStorage;
use crate::entity::assignment_projects::Column as ProjectColumn;
use crate::entity::manual_grading_results::{
    ActiveModel as ResultActiveModel, Column as ResultColumn, Entity as ManualGradingResults,
    Relation as ResultRelation,
};
use crate::entity::manual_grading_rubrics::{ActiveModel, Column, Entity as ManualGradingRubrics};
use crate::errors::{GitClassroomsError, Result};
use crate::models::grading::{
    entities::{ManualGradingResult, ManualGradingRubric},
    requests::{GradingResultInput, RubricRequest},
};

impl SeaOrmStorage {
    pub async fn create_rubric_impl(
        &self,
        classroom_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<ManualGradingRubric> {
        let now = chrono::Utc::now().timestamp();

        let result = ActiveModel {
            id: Set(Uuid::new_v4()),
            classroom_id: Set(classroom_id),
            name: Set(rubric.name.trim().to_string()),
            description: Set(rubric.description.clone()),
            max_score: Set(rubric.max_score),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| GitClassroomsError::database_operation(format!("创建评分细则失败: {e}")))?;

        Ok(result.into_rubric())
    }

    pub async fn get_rubric_impl(
        &self,
        classroom_id: Uuid,
        rubric_id: Uuid,
    ) -> Result<Option<ManualGradingRubric>> {
        let result = ManualGradingRubrics::find_by_id(rubric_id)
            .filter(Column::ClassroomId.eq(classroom_id))
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询评分细则失败: {e}")))?;

        Ok(result.map(|m| m.into_rubric()))
    }

    pub async fn list_rubrics_impl(&self, classroom_id: Uuid) -> Result<Vec<ManualGradingRubric>> {
        let result = ManualGradingRubrics::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询评分细则失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_rubric()).collect())
    }

    pub async fn update_rubric_impl(
        &self,
        rubric_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<Option<ManualGradingRubric>> {
        let Some(existing) = ManualGradingRubrics::find_by_id(rubric_id)
            .one(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询评分细则失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.name = Set(rubric.name.trim().to_string());
        model.description = Set(rubric.description.clone());
        model.max_score = Set(rubric.max_score);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("更新评分细则失败: {e}")))?;

        Ok(Some(result.into_rubric()))
    }

    pub async fn delete_rubric_impl(&self, rubric_id: Uuid) -> Result<bool> {
        let result = ManualGradingRubrics::delete_by_id(rubric_id)
            .exec(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("删除评分细则失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 按 (细则, 项目) 写入或覆盖评分
    pub async fn upsert_grading_results_impl(
        &self,
        assignment_project_id: Uuid,
        results: &[GradingResultInput],
    ) -> Result<Vec<ManualGradingResult>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("开启事务失败: {e}")))?;

        let mut saved = Vec::with_capacity(results.len());
        for input in results {
            let existing = ManualGradingResults::find()
                .filter(ResultColumn::RubricId.eq(input.rubric_id))
                .filter(ResultColumn::AssignmentProjectId.eq(assignment_project_id))
                .one(&txn)
                .await
                .map_err(|e| {
                    GitClassroomsError::database_operation(format!("查询评分结果失败: {e}"))
                })?;

            let model = match existing {
                Some(model) => {
                    let mut active: ResultActiveModel = model.into();
                    active.score = Set(input.score);
                    active.feedback = Set(input.feedback.clone());
                    active.updated_at = Set(now);
                    active.update(&txn).await
                }
                None => {
                    ResultActiveModel {
                        id: Set(Uuid::new_v4()),
                        rubric_id: Set(input.rubric_id),
                        assignment_project_id: Set(assignment_project_id),
                        score: Set(input.score),
                        feedback: Set(input.feedback.clone()),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(&txn)
                    .await
                }
            }
            .map_err(|e| GitClassroomsError::database_operation(format!("保存评分结果失败: {e}")))?;

            saved.push(model.into_result());
        }

        txn.commit()
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(saved)
    }

    pub async fn list_grading_results_impl(
        &self,
        assignment_project_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>> {
        let result = ManualGradingResults::find()
            .filter(ResultColumn::AssignmentProjectId.eq(assignment_project_id))
            .order_by_asc(ResultColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询评分结果失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_result()).collect())
    }

    /// 作业下所有项目的评分结果
    pub async fn list_assignment_grading_results_impl(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>> {
        let result = ManualGradingResults::find()
            .join(JoinType::InnerJoin, ResultRelation::AssignmentProject.def())
            .filter(ProjectColumn::AssignmentId.eq(assignment_id))
            .all(&self.db)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("查询评分结果失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_result()).collect())
    }
}
