use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::{ApiResponse, ErrorCode, common::PaginationQuery};
use crate::services::current_user;

pub async fn list_owned_classrooms(
    service: &ClassroomService,
    request: &HttpRequest,
    query: PaginationQuery,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let (page, size) = query.normalized();

    match storage.list_owned_classrooms(user.id, page, size).await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Owned classrooms retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve owned classrooms: {e}"),
            )),
        ),
    }
}

// 所有者视角的详情与普通详情一致，路由上限定为所有者
pub async fn get_owned_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    super::get::get_classroom(service, request).await
}
