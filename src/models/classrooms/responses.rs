use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use super::entities::Classroom;
use crate::gitlab::Runner;
use crate::models::common::PaginationInfo;
use crate::models::user_classrooms::entities::Role;

/// 用户视角的课堂：课堂本身加上调用者的角色和团队
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct UserClassroomResponse {
    pub classroom: Classroom,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct ClassroomListResponse {
    pub items: Vec<UserClassroomResponse>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct ClassroomRunnersResponse {
    pub gitlab_runners: Vec<Runner>,
    pub group_runners: Vec<Runner>,
}
