use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MemberService;
use crate::models::{ApiResponse, user_classrooms::entities::ClassroomMember};
use crate::services::require_extension;

pub async fn get_member(
    _service: &MemberService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match require_extension::<ClassroomMember>(request, "member") {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            member,
            "Member retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
