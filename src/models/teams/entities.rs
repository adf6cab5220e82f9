use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::models::user_classrooms::entities::ClassroomMember;

/// 团队，对应课堂组下的一个子组
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct Team {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub name: String,
    pub group_id: i64,
    pub gitlab_web_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct TeamWithMembers {
    #[serde(flatten)]
    #[ts(flatten)]
    pub team: Team,
    pub members: Vec<ClassroomMember>,
}
