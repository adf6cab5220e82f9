//! 团队实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub name: String,
    pub group_id: i64,
    pub gitlab_web_url: String,
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
    #[sea_orm(has_many = "super::user_classrooms::Entity")]
    UserClassrooms,
    #[sea_orm(has_many = "super::assignment_projects::Entity")]
    AssignmentProjects,
}

impl Related<super::classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::user_classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserClassrooms.def()
    }
}

impl Related<super::assignment_projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentProjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_team(self) -> crate::models::teams::entities::Team {
        use chrono::{DateTime, Utc};

        crate::models::teams::entities::Team {
            id: self.id,
            classroom_id: self.classroom_id,
            name: self.name,
            group_id: self.group_id,
            gitlab_web_url: self.gitlab_web_url,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
