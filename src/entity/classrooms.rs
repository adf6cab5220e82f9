//! 课堂实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub owner_id: i64,
    pub gitlab_group_id: i64,
    pub gitlab_web_url: String,
    pub group_access_token_id: i64,
    pub group_access_token: String,
    pub group_access_token_created_at: i64,
    pub archived: bool,
    pub create_teams: bool,
    pub max_team_size: i32,
    pub max_teams: i32,
    pub students_view_all_projects: bool,
    pub potentially_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::user_classrooms::Entity")]
    UserClassrooms,
    #[sea_orm(has_many = "super::teams::Entity")]
    Teams,
    #[sea_orm(has_many = "super::assignments::Entity")]
    Assignments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::user_classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserClassrooms.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_classroom(self) -> crate::models::classrooms::entities::Classroom {
        use chrono::{DateTime, Utc};

        crate::models::classrooms::entities::Classroom {
            id: self.id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            gitlab_group_id: self.gitlab_group_id,
            gitlab_web_url: self.gitlab_web_url,
            group_access_token_id: self.group_access_token_id,
            group_access_token: self.group_access_token,
            group_access_token_created_at: DateTime::<Utc>::from_timestamp(
                self.group_access_token_created_at,
                0,
            )
            .unwrap_or_default(),
            archived: self.archived,
            create_teams: self.create_teams,
            max_team_size: self.max_team_size,
            max_teams: self.max_teams,
            students_view_all_projects: self.students_view_all_projects,
            potentially_deleted: self.potentially_deleted,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
