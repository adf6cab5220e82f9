use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProjectService;
use crate::errors::GitClassroomsError;
use crate::models::{
    ApiResponse, ErrorCode,
    projects::{entities::AssignmentProject, responses::AssignmentProjectDetail},
    teams::entities::TeamWithMembers,
};
use crate::services::{classroom_context, internal_error, redirect, require_extension};

pub async fn get_project(
    service: &ProjectService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, project) = match (
        classroom_context(request),
        require_extension::<AssignmentProject>(request, "project"),
    ) {
        (Ok(ctx), Ok(project)) => (ctx, project),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let detail = async {
        let assignment = storage
            .get_assignment(ctx.classroom.id, project.assignment_id)
            .await?
            .ok_or_else(|| GitClassroomsError::not_found("assignment of project"))?;
        let team = storage
            .get_team(ctx.classroom.id, project.team_id)
            .await?
            .ok_or_else(|| GitClassroomsError::not_found("team of project"))?;
        let members = storage.list_team_members(team.id).await?;
        let grading_results = storage.list_grading_results(project.id).await?;
        Ok::<_, GitClassroomsError>(AssignmentProjectDetail {
            project,
            assignment,
            team: TeamWithMembers { team, members },
            grading_results,
        })
    }
    .await;

    match detail {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Project retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to load project: {e}"),
        )),
    }
}

/// 跳转到 fork 出的 GitLab 项目；还没接受的项目没有地址
pub async fn redirect_to_gitlab(
    _service: &ProjectService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let project = match require_extension::<AssignmentProject>(request, "project") {
        Ok(project) => project,
        Err(resp) => return Ok(resp),
    };
    match project.gitlab_web_url.as_deref() {
        Some(url) => Ok(redirect(url)),
        None => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ProjectNotAccepted,
            "project has not been accepted yet",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn detail_includes_assignment_and_team() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        let project = fx.accepted_project(&assignment, &red, 900).await;

        let req = fx.request_as(11).await;
        req.extensions_mut().insert(project);
        let body = body_json(get_project(&ProjectService::new_lazy(), &req).await.unwrap()).await;
        assert_eq!(body["data"]["assignment"]["name"], "Lab 1");
        assert_eq!(body["data"]["team"]["name"], "red");
        assert_eq!(body["data"]["project"]["project_status"], "accepted");
        assert!(body["data"]["grading_results"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn redirect_requires_accepted_project() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        let pending = fx.pending_project(&assignment, &red).await;

        let req = fx.owner_request().await;
        req.extensions_mut().insert(pending);
        let resp = redirect_to_gitlab(&ProjectService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
