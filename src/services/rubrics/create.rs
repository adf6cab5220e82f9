use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::RubricService;
use crate::models::{ApiResponse, ErrorCode, grading::requests::RubricRequest};
use crate::services::{bad_request, classroom_context, internal_error};

pub async fn create_rubric(
    service: &RubricService,
    request: &HttpRequest,
    body: RubricRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    if let Err(msg) = body.validate() {
        return Ok(bad_request(msg));
    }
    let storage = service.get_storage(request);

    match storage.create_rubric(ctx.classroom.id, &body).await {
        Ok(rubric) => {
            info!("Rubric {} created in classroom {}", rubric.id, ctx.classroom.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                rubric,
                "Rubric created successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::GradingFailed,
            format!("Failed to create rubric: {e}"),
        )),
    }
}
