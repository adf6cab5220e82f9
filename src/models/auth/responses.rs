use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

/// 当前用户，附带修改类请求需要放在 `X-Csrf-Token` 头中的令牌
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct MeResponse {
    pub user: User,
    pub csrf_token: String,
}
