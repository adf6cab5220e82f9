use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::InvitationService;
use crate::models::{
    ApiResponse, ErrorCode,
    invitations::entities::{ClassroomInvitation, InvitationStatus},
};
use crate::services::{internal_error, require_extension};

/// 只能撤销还在等待答复的邀请
pub async fn revoke_invitation(
    service: &InvitationService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let invitation = match require_extension::<ClassroomInvitation>(request, "invitation") {
        Ok(invitation) => invitation,
        Err(resp) => return Ok(resp),
    };
    if invitation.status != InvitationStatus::Pending {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::InvitationNotPending,
            "invitation is no longer pending",
        )));
    }
    let storage = service.get_storage(request);

    match storage
        .update_invitation_status(invitation.id, InvitationStatus::Revoked)
        .await
    {
        Ok(Some(updated)) => {
            info!("Invitation {} revoked", updated.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                updated,
                "Invitation revoked successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::InvitationNotFound,
            "invitation not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to revoke invitation: {e}"),
        )),
    }
}
