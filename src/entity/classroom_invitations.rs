//! 课堂邀请实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classroom_invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub email: String,
    pub status: String,
    pub expiry_date: i64,
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
}

impl Related<super::classrooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_invitation(self) -> crate::models::invitations::entities::ClassroomInvitation {
        use crate::models::invitations::entities::{ClassroomInvitation, InvitationStatus};
        use chrono::{DateTime, Utc};

        ClassroomInvitation {
            id: self.id,
            classroom_id: self.classroom_id,
            email: self.email,
            status: self
                .status
                .parse::<InvitationStatus>()
                .unwrap_or(InvitationStatus::Revoked),
            expiry_date: DateTime::<Utc>::from_timestamp(self.expiry_date, 0).unwrap_or_default(),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
