use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{entities::Assignment, requests::AssignRubricsRequest},
};
use crate::services::{classroom_context, internal_error, require_extension};

pub async fn list_assignment_rubrics(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let assignment = match require_extension::<Assignment>(request, "assignment") {
        Ok(assignment) => assignment,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_assignment_rubrics(assignment.id).await {
        Ok(rubrics) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            rubrics,
            "Assignment rubrics retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to retrieve assignment rubrics: {e}"),
        )),
    }
}

/// 用给定的细则替换作业的细则集合，细则必须属于同一课堂
pub async fn assign_rubrics(
    service: &AssignmentService,
    request: &HttpRequest,
    body: AssignRubricsRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, assignment) = match (
        classroom_context(request),
        require_extension::<Assignment>(request, "assignment"),
    ) {
        (Ok(ctx), Ok(assignment)) => (ctx, assignment),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    for rubric_id in &body.rubric_ids {
        match storage.get_rubric(ctx.classroom.id, *rubric_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::RubricNotFound,
                    format!("rubric {rubric_id} not found"),
                )));
            }
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::GradingFailed,
                    format!("Failed to load rubric: {e}"),
                ));
            }
        }
    }

    let result = async {
        storage
            .set_assignment_rubrics(assignment.id, &body.rubric_ids)
            .await?;
        storage.list_assignment_rubrics(assignment.id).await
    }
    .await;

    match result {
        Ok(rubrics) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            rubrics,
            "Assignment rubrics updated successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::GradingFailed,
            format!("Failed to update assignment rubrics: {e}"),
        )),
    }
}
