use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::RubricService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{classroom_context, internal_error};

pub async fn list_rubrics(
    service: &RubricService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_rubrics(ctx.classroom.id).await {
        Ok(rubrics) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            rubrics,
            "Rubric list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to retrieve rubrics: {e}"),
        )),
    }
}
