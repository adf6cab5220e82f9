//! 作业实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub template_project_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub due_date: Option<i64>,
    pub closed: bool,
    pub enable_junit_grading: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classrooms::Entity",
        from = "Column::ClassroomId",
        to = "super::classrooms::Column::Id"
    )]
    Classroom,
    #[sea_orm(has_many = "super::assignment_projects::Entity")]
    AssignmentProjects,
    #[sea_orm(has_many = "super::assignment_rubrics::Entity")]
    AssignmentRubrics,
}

impl Related<super::classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::assignment_projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentProjects.def()
    }
}

impl Related<super::assignment_rubrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentRubrics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_assignment(self) -> crate::models::assignments::entities::Assignment {
        use chrono::{DateTime, Utc};

        crate::models::assignments::entities::Assignment {
            id: self.id,
            classroom_id: self.classroom_id,
            template_project_id: self.template_project_id,
            name: self.name,
            description: self.description,
            due_date: self
                .due_date
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            closed: self.closed,
            enable_junit_grading: self.enable_junit_grading,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
