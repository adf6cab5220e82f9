use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::InvitationService;
use super::view::load_own_invitation;
use crate::errors::GitClassroomsError;
use crate::models::{ApiResponse, ErrorCode, invitations::entities::InvitationStatus};
use crate::services::{current_user, internal_error};

/// 接受邀请：以学生身份加入课堂（已是成员时保留原角色）
pub async fn accept_invitation(
    service: &InvitationService,
    request: &HttpRequest,
    invitation_id: Uuid,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let invitation = match load_own_invitation(&storage, &user, invitation_id).await {
        Ok(invitation) => invitation,
        Err(resp) => return Ok(resp),
    };
    if let Err((code, message)) = invitation.check_answerable(Utc::now()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message)));
    }

    match storage.accept_invitation(invitation.id, user.id).await {
        Ok(membership) => {
            info!(
                "User {} joined classroom {} through invitation {}",
                user.id, membership.classroom_id, invitation.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                membership,
                "Invitation accepted",
            )))
        }
        // 检查之后邀请被撤销或已过期
        Err(GitClassroomsError::Validation(message)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::InvitationNotPending, message),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to accept invitation: {e}"),
        )),
    }
}

pub async fn reject_invitation(
    service: &InvitationService,
    request: &HttpRequest,
    invitation_id: Uuid,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let invitation = match load_own_invitation(&storage, &user, invitation_id).await {
        Ok(invitation) => invitation,
        Err(resp) => return Ok(resp),
    };
    if let Err((code, message)) = invitation.check_answerable(Utc::now()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message)));
    }

    match storage
        .update_invitation_status(invitation.id, InvitationStatus::Rejected)
        .await
    {
        Ok(Some(updated)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Invitation rejected",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::InvitationNotFound,
            "invitation not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to reject invitation: {e}"),
        )),
    }
}
