//! 人工评分结果实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "manual_grading_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rubric_id: Uuid,
    pub assignment_project_id: Uuid,
    pub score: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manual_grading_rubrics::Entity",
        from = "Column::RubricId",
        to = "super::manual_grading_rubrics::Column::Id"
    )]
    Rubric,
    #[sea_orm(
        belongs_to = "super::assignment_projects::Entity",
        from = "Column::AssignmentProjectId",
        to = "super::assignment_projects::Column::Id"
    )]
    AssignmentProject,
}

impl Related<super::manual_grading_rubrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rubric.def()
    }
}

impl Related<super::assignment_projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentProject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_result(self) -> crate::models::grading::entities::ManualGradingResult {
        use chrono::{DateTime, Utc};

        crate::models::grading::entities::ManualGradingResult {
            id: self.id,
            rubric_id: self.rubric_id,
            assignment_project_id: self.assignment_project_id,
            score: self.score,
            feedback: self.feedback,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
