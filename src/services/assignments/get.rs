use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{ApiResponse, assignments::entities::Assignment};
use crate::services::require_extension;

pub async fn get_assignment(
    _service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match require_extension::<Assignment>(request, "assignment") {
        Ok(assignment) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            assignment,
            "Assignment retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
