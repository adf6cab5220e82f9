//! 作业项目实体（作业与团队的关联）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub team_id: Uuid,
    pub project_status: String,
    pub gitlab_project_id: Option<i64>,
    pub gitlab_web_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub junit_test_result: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id"
    )]
    Team,
    #[sea_orm(has_many = "super::manual_grading_results::Entity")]
    ManualGradingResults,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::manual_grading_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualGradingResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_assignment_project(self) -> crate::models::projects::entities::AssignmentProject {
        use crate::models::projects::entities::{AssignmentProject, ProjectStatus};
        use chrono::{DateTime, Utc};

        AssignmentProject {
            id: self.id,
            assignment_id: self.assignment_id,
            team_id: self.team_id,
            project_status: self
                .project_status
                .parse::<ProjectStatus>()
                .unwrap_or(ProjectStatus::Pending),
            gitlab_project_id: self.gitlab_project_id,
            gitlab_web_url: self.gitlab_web_url,
            // 解析失败视为没有结果
            junit_test_result: self
                .junit_test_result
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
