use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::MemberService;
use crate::errors::GitClassroomsError;
use crate::gitlab::{AccessLevel, GitLabError};
use crate::models::{
    ApiResponse, ErrorCode,
    user_classrooms::{
        entities::{ClassroomMember, Role},
        requests::UpdateMemberTeamRequest,
    },
};
use crate::services::{
    access_levels, bad_request, classroom_context, gitlab_error, internal_error,
    require_extension,
};
use crate::utils::Compensator;

/// 管理者把成员分到团队（或移出团队），同步 GitLab 团队子组和团队项目的成员关系
pub async fn update_member_team(
    service: &MemberService,
    request: &HttpRequest,
    body: UpdateMemberTeamRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, member) = match (
        classroom_context(request),
        require_extension::<ClassroomMember>(request, "member"),
    ) {
        (Ok(ctx), Ok(member)) => (ctx, member),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if member.team_id == body.team_id {
        return Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Member is already in this team",
        )));
    }
    let storage = service.get_storage(request);
    let db_error = |e: GitClassroomsError| {
        internal_error(
            ErrorCode::MemberUpdateFailed,
            format!("Failed to update member team: {e}"),
        )
    };

    let new_team = match body.team_id {
        Some(team_id) => match storage.get_team(ctx.classroom.id, team_id).await {
            Ok(Some(team)) => Some(team),
            Ok(None) => return Ok(bad_request("team does not belong to this classroom")),
            Err(e) => return Ok(db_error(e)),
        },
        None => None,
    };
    if let Some(team) = &new_team {
        match storage.count_team_members(team.id).await {
            Ok(count) if ctx.classroom.team_is_full(count) => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::TeamFull,
                    format!("team '{}' is full", team.name),
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(db_error(e)),
        }
    }
    let old_team = match member.team_id {
        Some(team_id) => match storage.get_team(ctx.classroom.id, team_id).await {
            Ok(team) => team,
            Err(e) => return Ok(db_error(e)),
        },
        None => None,
    };
    let new_projects = match &new_team {
        Some(team) if member.role == Role::Student => {
            match storage.list_accepted_projects_by_team(team.id, true).await {
                Ok(projects) => projects,
                Err(e) => return Ok(db_error(e)),
            }
        }
        _ => Vec::new(),
    };
    let old_projects = match &old_team {
        Some(team) => match storage.list_accepted_projects_by_team(team.id, false).await {
            Ok(projects) => projects,
            Err(e) => return Ok(db_error(e)),
        },
        None => Vec::new(),
    };

    let user_id = member.user.id;
    let mut saga: Compensator<GitLabError> =
        Compensator::new(format!("move user {user_id} between teams"));
    if let Some(team) = &new_team {
        let undo = ctx.gitlab.clone();
        let group_id = team.group_id;
        if let Err(e) = saga
            .execute(
                "join team group",
                ctx.gitlab
                    .add_user_to_group(group_id, user_id, AccessLevel::Reporter),
                move || async move { undo.remove_user_from_group(group_id, user_id).await },
            )
            .await
        {
            return Ok(gitlab_error("Failed to add member to team group", &e));
        }
    }
    if let Err(e) =
        access_levels::grant_team_projects(&ctx.gitlab, &new_projects, user_id, &mut saga).await
    {
        saga.rollback().await;
        return Ok(gitlab_error("Failed to grant access to team projects", &e));
    }

    let updated = match storage
        .update_member_team(ctx.classroom.id, user_id, body.team_id)
        .await
    {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            saga.rollback().await;
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::MemberNotFound,
                "member not found",
            )));
        }
        Err(GitClassroomsError::Validation(msg)) => {
            saga.rollback().await;
            return Ok(bad_request(msg));
        }
        Err(e) => {
            saga.rollback().await;
            return Ok(db_error(e));
        }
    };
    saga.commit();

    // 离开旧团队组及其项目失败不影响结果
    if let Some(team) = old_team {
        if let Err(e) = ctx.gitlab.remove_user_from_group(team.group_id, user_id).await
            && !e.is_not_found()
        {
            warn!(
                "Failed to remove user {} from team group {}: {}",
                user_id, team.group_id, e
            );
        }
        if let Err(e) =
            access_levels::revoke_team_projects(&ctx.gitlab, &old_projects, user_id).await
        {
            warn!(
                "Failed to revoke project access of user {} in team {}: {}",
                user_id, team.id, e
            );
        }
    }

    info!(
        "Classroom {}: user {} moved to team {:?}",
        ctx.classroom.id, user_id, body.team_id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        updated,
        "Member team updated successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    async fn move_member(fx: &Fixture, user_id: i64, team_id: Option<uuid::Uuid>) -> HttpResponse {
        let member = fx
            .storage
            .get_member(fx.classroom.id, user_id)
            .await
            .unwrap()
            .unwrap();
        let req = fx.owner_request().await;
        req.extensions_mut().insert(member);
        update_member_team(
            &MemberService::new_lazy(),
            &req,
            UpdateMemberTeamRequest { team_id },
        )
        .await
        .unwrap()
    }

    #[actix_web::test]
    async fn moving_member_switches_team_groups() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let blue = fx.team("blue", &[]).await;

        let resp = move_member(&fx, 11, Some(blue.id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            fx.fake.group_member_level(blue.group_id, 11),
            Some(AccessLevel::Reporter)
        );
        assert_eq!(fx.fake.count("remove_user_from_group"), 1);
        assert!(fx.fake.group_member_level(red.group_id, 11).is_none());

        let stored = fx.storage.get_membership(fx.classroom.id, 11).await.unwrap().unwrap();
        assert_eq!(stored.team_id, Some(blue.id));
    }

    #[actix_web::test]
    async fn full_team_is_rejected() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11, 12]).await;
        fx.member(13, Role::Student).await;

        let resp = move_member(&fx, 13, Some(red.id)).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(fx.fake.count("add_user_to_group"), 0);
    }

    #[actix_web::test]
    async fn storage_failure_undoes_group_membership() {
        let fx = Fixture::new().await;
        let blue = fx.team("blue", &[]).await;
        fx.member(11, Role::Student).await;
        // 成员在此期间被移除，存储更新返回 None
        let member = fx.storage.get_member(fx.classroom.id, 11).await.unwrap().unwrap();
        fx.storage.remove_member(fx.classroom.id, 11).await.unwrap();
        let req = fx.owner_request().await;
        req.extensions_mut().insert(member);

        let resp = update_member_team(
            &MemberService::new_lazy(),
            &req,
            UpdateMemberTeamRequest {
                team_id: Some(blue.id),
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(fx.fake.group_member_level(blue.group_id, 11).is_none());
    }

    #[actix_web::test]
    async fn moving_member_swaps_team_project_access() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let blue = fx.team("blue", &[12]).await;
        let assignment = fx.assignment(None).await;
        fx.accepted_project(&assignment, &red, 900).await;
        fx.accepted_project(&assignment, &blue, 901).await;
        fx.fake.set_access_level(900, 11, AccessLevel::Developer);

        let resp = move_member(&fx, 11, Some(blue.id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::NoPermissions);
        assert_eq!(fx.fake.access_level(901, 11), AccessLevel::Developer);

        // 移出团队后不再保留任何项目权限
        let resp = move_member(&fx, 11, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.fake.access_level(901, 11), AccessLevel::NoPermissions);
    }
}
