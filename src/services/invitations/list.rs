use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::InvitationService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{classroom_context, internal_error};

pub async fn list_invitations(
    service: &InvitationService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_invitations(ctx.classroom.id).await {
        Ok(invitations) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            invitations,
            "Invitation list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to retrieve invitations: {e}"),
        )),
    }
}
