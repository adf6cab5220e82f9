use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::{
    ApiResponse, ErrorCode,
    classrooms::requests::{ClassroomListFilter, ClassroomQueryParams},
};
use crate::services::current_user;

pub async fn list_classrooms(
    service: &ClassroomService,
    request: &HttpRequest,
    query: ClassroomQueryParams,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (page, size) = query.pagination.normalized();
    let filter = ClassroomListFilter {
        page,
        size,
        role: query.role,
        archived: query.archived,
    };

    match storage.list_user_classrooms(user.id, filter).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Classroom list retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve classroom list: {e}"),
            )),
        ),
    }
}
