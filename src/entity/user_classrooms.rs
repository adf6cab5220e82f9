//! 课堂成员关系实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_classrooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub classroom_id: Uuid,
    pub role: String,
    pub team_id: Option<Uuid>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::classrooms::Entity",
        from = "Column::ClassroomId",
        to = "super::classrooms::Column::Id"
    )]
    Classroom,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id"
    )]
    Team,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_user_classroom(self) -> crate::models::user_classrooms::entities::UserClassroom {
        use crate::models::user_classrooms::entities::{Role, UserClassroom};
        use chrono::{DateTime, Utc};

        UserClassroom {
            user_id: self.user_id,
            classroom_id: self.classroom_id,
            role: self.role.parse::<Role>().unwrap_or(Role::Student),
            team_id: self.team_id,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    /// 与用户资料合并为成员视图
    pub fn into_member(
        self,
        user: super::users::Model,
    ) -> crate::models::user_classrooms::entities::ClassroomMember {
        use crate::models::user_classrooms::entities::{ClassroomMember, Role};
        use chrono::{DateTime, Utc};

        ClassroomMember {
            user: user.into_user(),
            role: self.role.parse::<Role>().unwrap_or(Role::Student),
            team_id: self.team_id,
            joined_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
