use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::ClassroomService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{classroom_context, gitlab_error};

/// 删除课堂；可能已在 GitLab 上删除的课堂不再调用 GitLab
pub async fn delete_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let classroom = &ctx.classroom;

    if !classroom.potentially_deleted {
        match ctx.gitlab.delete_group(classroom.gitlab_group_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(
                    "GitLab group {} of classroom {} is already gone",
                    classroom.gitlab_group_id, classroom.id
                );
            }
            Err(e) => return Ok(gitlab_error("Failed to delete GitLab group", &e)),
        }
    }

    match storage.delete_classroom(classroom.id).await {
        Ok(true) => {
            info!("Classroom {} deleted", classroom.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Classroom deleted successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassroomNotFound,
            "classroom not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::ClassroomDeleteFailed,
                format!("Classroom deletion failed: {e}"),
            )),
        ),
    }
}
