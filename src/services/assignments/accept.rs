use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::{error, info};

use super::AssignmentService;
use crate::gitlab::AccessLevel;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::entities::Assignment,
    projects::entities::ProjectStatus,
    user_classrooms::entities::Role,
};
use crate::services::{classroom_context, gitlab_error, internal_error, require_extension};

/// 团队成员接受作业：模板 fork 到团队子组，状态 Pending → Creating → Accepted，
/// 学生成员获得 Developer 权限
pub async fn accept_assignment(
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
    // 截止检查任务可能还没来得及关闭作业
    if assignment.closed || assignment.is_past_due(Utc::now()) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AssignmentClosed,
            "assignment is closed",
        )));
    }
    let Some(team_id) = ctx.membership.team_id else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::TeamNotFound,
            "join a team before accepting an assignment",
        )));
    };
    let storage = service.get_storage(request);
    let db_error = |e: crate::errors::GitClassroomsError| {
        internal_error(
            ErrorCode::AssignmentAcceptFailed,
            format!("Failed to accept assignment: {e}"),
        )
    };

    let project = match storage
        .get_assignment_project_by_team(assignment.id, team_id)
        .await
    {
        Ok(Some(project)) => project,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ProjectNotFound,
                "your team was not invited to this assignment",
            )));
        }
        Err(e) => return Ok(db_error(e)),
    };
    if project.project_status != ProjectStatus::Pending {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::Conflict,
            format!("assignment project is already {}", project.project_status),
        )));
    }
    let team = match storage.get_team(ctx.classroom.id, team_id).await {
        Ok(Some(team)) => team,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::TeamNotFound,
                "team not found",
            )));
        }
        Err(e) => return Ok(db_error(e)),
    };

    // 并发接受时只有一个请求能把 Pending 改成 Creating
    match storage.claim_pending_project(project.id).await {
        Ok(true) => {}
        Ok(false) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::Conflict,
                "assignment is already being accepted by a teammate",
            )));
        }
        Err(e) => return Ok(db_error(e)),
    }

    let fork = match ctx
        .gitlab
        .fork_project(
            assignment.template_project_id,
            team.group_id,
            &format!("{}-{}", assignment.name, team.name),
            &assignment.description,
        )
        .await
    {
        Ok(fork) => fork,
        Err(e) => {
            // fork 失败时退回 Pending，允许重试
            if let Err(reset) = storage
                .update_project_status(project.id, ProjectStatus::Pending, None, None)
                .await
            {
                error!("Failed to reset project {}: {}", project.id, reset);
            }
            return Ok(gitlab_error("Failed to fork template project", &e));
        }
    };

    let accepted = match storage
        .update_project_status(
            project.id,
            ProjectStatus::Accepted,
            Some(fork.id),
            Some(fork.web_url.clone()),
        )
        .await
    {
        Ok(Some(accepted)) => accepted,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ProjectNotFound,
                "project not found",
            )));
        }
        Err(e) => return Ok(db_error(e)),
    };

    let members = match storage.list_team_members(team.id).await {
        Ok(members) => members,
        Err(e) => return Ok(db_error(e)),
    };
    for member in members.iter().filter(|m| m.role == Role::Student) {
        if let Err(e) = ctx
            .gitlab
            .change_user_access_level_in_project(fork.id, member.user.id, AccessLevel::Developer)
            .await
        {
            return Ok(gitlab_error(
                &format!("Failed to grant developer access to user {}", member.user.id),
                &e,
            ));
        }
    }

    info!(
        "Team {} accepted assignment {} as GitLab project {}",
        team.id, assignment.id, fork.id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        accepted,
        "Assignment accepted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn fork_lands_in_team_group_and_students_become_developers() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12]).await;
        let assignment = fx.assignment(None).await;
        fx.pending_project(&assignment, &team).await;
        let req = fx.request_as(11).await;
        req.extensions_mut().insert(assignment.clone());

        let resp = accept_assignment(&AssignmentService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let project = fx
            .storage
            .get_assignment_project_by_team(assignment.id, team.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.project_status, ProjectStatus::Accepted);
        let fork_id = project.gitlab_project_id.unwrap();
        let fork_call = fx
            .fake
            .calls()
            .into_iter()
            .find(|c| c.op == "fork_project")
            .unwrap();
        assert_eq!(fork_call.detail, format!("500->{}:Lab 1-red", team.group_id));
        assert_eq!(fx.fake.access_level(fork_id, 11), AccessLevel::Developer);
        assert_eq!(fx.fake.access_level(fork_id, 12), AccessLevel::Developer);

        // 再次接受冲突
        let again = fx.request_as(12).await;
        again.extensions_mut().insert(assignment);
        let resp = accept_assignment(&AssignmentService::new_lazy(), &again)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn failed_fork_returns_project_to_pending() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        fx.pending_project(&assignment, &team).await;
        fx.fake.fail_on("fork_project", 1);
        let req = fx.request_as(11).await;
        req.extensions_mut().insert(assignment.clone());

        let resp = accept_assignment(&AssignmentService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let project = fx
            .storage
            .get_assignment_project_by_team(assignment.id, team.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.project_status, ProjectStatus::Pending);
    }

    #[actix_web::test]
    async fn concurrent_accepts_fork_only_once() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12]).await;
        let assignment = fx.assignment(None).await;
        fx.pending_project(&assignment, &team).await;
        let first = fx.request_as(11).await;
        first.extensions_mut().insert(assignment.clone());
        let second = fx.request_as(12).await;
        second.extensions_mut().insert(assignment.clone());

        let service = AssignmentService::new_lazy();
        let (a, b) = tokio::join!(
            accept_assignment(&service, &first),
            accept_assignment(&service, &second)
        );
        let mut statuses = vec![a.unwrap().status().as_u16(), b.unwrap().status().as_u16()];
        statuses.sort();
        assert_eq!(statuses, vec![200, 409]);
        assert_eq!(fx.fake.count("fork_project"), 1);

        let project = fx
            .storage
            .get_assignment_project_by_team(assignment.id, team.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.project_status, ProjectStatus::Accepted);
    }

    #[actix_web::test]
    async fn failed_developer_grant_is_reported() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12]).await;
        let assignment = fx.assignment(None).await;
        fx.pending_project(&assignment, &team).await;
        fx.fake.fail_on("change_user_access_level_in_project", 1);
        let req = fx.request_as(11).await;
        req.extensions_mut().insert(assignment);

        let resp = accept_assignment(&AssignmentService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["code"], ErrorCode::GitLabError as i32);
        // 第一次授权失败后不再继续
        assert_eq!(fx.fake.count("change_user_access_level_in_project"), 1);
    }

    #[actix_web::test]
    async fn student_without_team_is_rejected() {
        let fx = Fixture::new().await;
        fx.member(11, Role::Student).await;
        let assignment = fx.assignment(None).await;
        let req = fx.request_as(11).await;
        req.extensions_mut().insert(assignment);

        let resp = accept_assignment(&AssignmentService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
