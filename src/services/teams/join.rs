use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeamService;
use crate::errors::GitClassroomsError;
use crate::gitlab::{AccessLevel, GitLabError};
use crate::middlewares::ClassroomContext;
use crate::models::{
    ApiResponse, ErrorCode,
    teams::entities::Team,
    user_classrooms::{entities::UserClassroom, policies::is_student},
};
use crate::services::{
    access_levels, bad_request, classroom_context, gitlab_error, internal_error,
    require_extension,
};
use crate::storage::Storage;
use crate::utils::Compensator;

/// 把用户加入团队子组（Reporter）并记录成员关系；学生同时获得团队已接受且未关闭作业项目的
/// Developer 权限。记录失败时撤销这些 GitLab 修改
pub(super) async fn enter_team(
    storage: &dyn Storage,
    ctx: &ClassroomContext,
    team: &Team,
    user_id: i64,
) -> Result<UserClassroom, HttpResponse> {
    let projects = if is_student(&ctx.membership) {
        storage
            .list_accepted_projects_by_team(team.id, true)
            .await
            .map_err(|e| {
                internal_error(
                    ErrorCode::TeamUpdateFailed,
                    format!("Failed to load team projects: {e}"),
                )
            })?
    } else {
        Vec::new()
    };

    let mut saga: Compensator<GitLabError> =
        Compensator::new(format!("user {user_id} joins team {}", team.id));
    let undo = ctx.gitlab.clone();
    let group_id = team.group_id;
    saga.execute(
        "add to team group",
        ctx.gitlab
            .add_user_to_group(group_id, user_id, AccessLevel::Reporter),
        move || async move { undo.remove_user_from_group(group_id, user_id).await },
    )
    .await
    .map_err(|e| gitlab_error("Failed to add user to team group", &e))?;
    if let Err(e) =
        access_levels::grant_team_projects(&ctx.gitlab, &projects, user_id, &mut saga).await
    {
        saga.rollback().await;
        return Err(gitlab_error("Failed to grant access to team projects", &e));
    }

    let result = storage
        .update_member_team(ctx.classroom.id, user_id, Some(team.id))
        .await;
    match result {
        Ok(Some(membership)) => {
            saga.commit();
            Ok(membership)
        }
        Ok(None) => {
            saga.rollback().await;
            Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::MemberNotFound,
                "member not found",
            )))
        }
        Err(GitClassroomsError::Validation(msg)) => {
            saga.rollback().await;
            Err(bad_request(msg))
        }
        Err(e) => {
            saga.rollback().await;
            Err(internal_error(
                ErrorCode::TeamUpdateFailed,
                format!("Failed to join team: {e}"),
            ))
        }
    }
}

/// 学生加入团队；已经在团队中或团队已满时返回 409
pub async fn join_team(service: &TeamService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (ctx, team) = match (
        classroom_context(request),
        require_extension::<Team>(request, "team"),
    ) {
        (Ok(ctx), Ok(team)) => (ctx, team),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if ctx.membership.team_id.is_some() {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::AlreadyInTeam,
            "you are already in a team",
        )));
    }
    let storage = service.get_storage(request);

    match storage.count_team_members(team.id).await {
        Ok(count) if ctx.classroom.team_is_full(count) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TeamFull,
                format!("team '{}' is full", team.name),
            )));
        }
        Ok(_) => {}
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to count team members: {e}"),
            ));
        }
    }

    let user_id = ctx.membership.user_id;
    match enter_team(storage.as_ref(), &ctx, &team, user_id).await {
        Ok(membership) => {
            info!("User {} joined team {}", user_id, team.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                membership,
                "Joined team successfully",
            )))
        }
        Err(resp) => Ok(resp),
    }
}
