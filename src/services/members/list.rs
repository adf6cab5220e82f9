use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MemberService;
use crate::models::{ApiResponse, ErrorCode, user_classrooms::requests::MemberListQuery};
use crate::services::{classroom_context, internal_error};

pub async fn list_members(
    service: &MemberService,
    request: &HttpRequest,
    query: MemberListQuery,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (page, size) = query.pagination.normalized();

    match storage
        .list_members(ctx.classroom.id, query.role, page, size)
        .await
    {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            members,
            "Member list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to retrieve members: {e}"),
        )),
    }
}
