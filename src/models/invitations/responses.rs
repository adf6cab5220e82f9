use serde::Serialize;
use ts_rs::TS;

use super::entities::ClassroomInvitation;

/// 受邀者看到的邀请
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/invitation.ts")]
pub struct InvitationDetail {
    pub invitation: ClassroomInvitation,
    pub classroom_name: String,
    pub classroom_description: String,
}
