use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeamService;
use crate::models::{ApiResponse, ErrorCode, teams::entities::Team};
use crate::services::{classroom_context, gitlab_error, internal_error, require_extension};

/// 已经接受过作业的团队不能删除，否则会丢掉学生的项目
pub async fn delete_team(
    service: &TeamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, team) = match (
        classroom_context(request),
        require_extension::<Team>(request, "team"),
    ) {
        (Ok(ctx), Ok(team)) => (ctx, team),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.team_has_accepted_projects(team.id).await {
        Ok(true) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TeamHasProjects,
                "team has accepted assignments and cannot be deleted",
            )));
        }
        Ok(false) => {}
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to check team projects: {e}"),
            ));
        }
    }

    if let Err(e) = ctx.gitlab.delete_group(team.group_id).await
        && !e.is_not_found()
    {
        return Ok(gitlab_error("Failed to delete team subgroup", &e));
    }

    match storage.delete_team(team.id).await {
        Ok(_) => {
            info!("Team {} deleted from classroom {}", team.id, ctx.classroom.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Team deleted successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to delete team: {e}"),
        )),
    }
}
