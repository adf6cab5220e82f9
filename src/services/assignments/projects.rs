use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode, assignments::entities::Assignment,
    user_classrooms::policies::can_view_project,
};
use crate::services::{classroom_context, require_extension};

/// 作业下的项目；学生只能看到可见的项目
pub async fn list_projects(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, assignment) = match (
        classroom_context(request),
        require_extension::<Assignment>(request, "assignment"),
    ) {
        (Ok(ctx), Ok(assignment)) => (ctx, assignment),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_assignment_projects(assignment.id).await {
        Ok(projects) => {
            let visible: Vec<_> = projects
                .into_iter()
                .filter(|p| can_view_project(&ctx.classroom, &ctx.membership, Some(p.team_id)))
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                visible,
                "Assignment projects retrieved successfully",
            )))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve assignment projects: {e}"),
            )),
        ),
    }
}
