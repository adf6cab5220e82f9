use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::RubricService;
use crate::models::{ApiResponse, ErrorCode, grading::entities::ManualGradingRubric};
use crate::services::{internal_error, require_extension};

/// 删除细则，连同它在各作业上的挂载和已有评分
pub async fn delete_rubric(
    service: &RubricService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let rubric = match require_extension::<ManualGradingRubric>(request, "rubric") {
        Ok(rubric) => rubric,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.delete_rubric(rubric.id).await {
        Ok(_) => {
            info!("Rubric {} deleted", rubric.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Rubric deleted successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::GradingFailed,
            format!("Failed to delete rubric: {e}"),
        )),
    }
}
