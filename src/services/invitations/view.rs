use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use uuid::Uuid;

use super::InvitationService;
use crate::models::{
    ApiResponse, ErrorCode,
    invitations::{entities::ClassroomInvitation, responses::InvitationDetail},
    users::entities::User,
};
use crate::services::{current_user, internal_error};
use crate::storage::Storage;

/// 加载发给当前用户的邀请；不存在为 404，发给别人为 403
pub(super) async fn load_own_invitation(
    storage: &Arc<dyn Storage>,
    user: &User,
    invitation_id: Uuid,
) -> Result<ClassroomInvitation, HttpResponse> {
    let invitation = match storage.get_invitation(invitation_id).await {
        Ok(Some(invitation)) => invitation,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::InvitationNotFound,
                "invitation not found",
            )));
        }
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to load invitation: {e}"),
            ));
        }
    };
    if !invitation.is_for(&user.email) {
        return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::InvitationEmailMismatch,
            "this invitation was sent to a different e-mail address",
        )));
    }
    Ok(invitation)
}

pub async fn view_invitation(
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

    match storage.get_classroom_by_id(invitation.classroom_id).await {
        Ok(Some(classroom)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            InvitationDetail {
                invitation,
                classroom_name: classroom.name,
                classroom_description: classroom.description,
            },
            "Invitation retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassroomNotFound,
            "classroom not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to load classroom: {e}"),
        )),
    }
}
