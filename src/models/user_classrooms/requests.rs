use serde::Deserialize;
use ts_rs::TS;
use uuid::Uuid;

use super::entities::Role;
use crate::models::common::PaginationQuery;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub struct MemberListQuery {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub struct UpdateMemberRoleRequest {
    pub role: Role,
}

/// `team_id` 为空表示移出团队
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub struct UpdateMemberTeamRequest {
    pub team_id: Option<Uuid>,
}
