use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::{ApiResponse, classrooms::responses::ClassroomRunnersResponse};
use crate::services::{classroom_context, gitlab_error, redirect};

pub async fn redirect_to_gitlab(
    _service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match classroom_context(request) {
        Ok(ctx) => Ok(redirect(&ctx.classroom.gitlab_web_url)),
        Err(resp) => Ok(resp),
    }
}

// 实例级 runner 与课堂组 runner
pub async fn list_runners(
    _service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    let gitlab_runners = match ctx.gitlab.get_available_runners_for_gitlab().await {
        Ok(runners) => runners,
        Err(e) => return Ok(gitlab_error("Failed to list instance runners", &e)),
    };
    let group_runners = match ctx
        .gitlab
        .get_available_runners_for_group(ctx.classroom.gitlab_group_id)
        .await
    {
        Ok(runners) => runners,
        Err(e) => return Ok(gitlab_error("Failed to list group runners", &e)),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ClassroomRunnersResponse {
            gitlab_runners,
            group_runners,
        },
        "Runners retrieved successfully",
    )))
}
