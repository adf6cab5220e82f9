use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::MemberService;
use crate::models::{
    ApiResponse, ErrorCode,
    user_classrooms::{
        entities::{ClassroomMember, Role},
        policies::is_owner,
    },
};
use crate::services::{
    access_levels, classroom_context, gitlab_error, internal_error, require_extension,
};

/// 创建者可以移除任何其他成员，成员也可以自己退出；创建者本人不能被移除
pub async fn remove_member(
    service: &MemberService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, member) = match (
        classroom_context(request),
        require_extension::<ClassroomMember>(request, "member"),
    ) {
        (Ok(ctx), Ok(member)) => (ctx, member),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if member.role == Role::Owner {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassroomPermissionDenied,
            "the owner cannot leave the classroom",
        )));
    }
    if !is_owner(&ctx.membership) && ctx.membership.user_id != member.user.id {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassroomPermissionDenied,
            "only the owner can remove other members",
        )));
    }
    let storage = service.get_storage(request);

    if let Some(team_id) = member.team_id {
        let team = match storage.get_team(ctx.classroom.id, team_id).await {
            Ok(team) => team,
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::MemberRemoveFailed,
                    format!("Failed to load team: {e}"),
                ));
            }
        };
        if let Some(team) = team {
            let projects = match storage.list_accepted_projects_by_team(team.id, false).await {
                Ok(projects) => projects,
                Err(e) => {
                    return Ok(internal_error(
                        ErrorCode::MemberRemoveFailed,
                        format!("Failed to load team projects: {e}"),
                    ));
                }
            };
            if let Err(e) = ctx
                .gitlab
                .remove_user_from_group(team.group_id, member.user.id)
                .await
                && !e.is_not_found()
            {
                return Ok(gitlab_error("Failed to remove member from team group", &e));
            }
            if let Err(e) =
                access_levels::revoke_team_projects(&ctx.gitlab, &projects, member.user.id).await
            {
                return Ok(gitlab_error("Failed to remove member from team projects", &e));
            }
        }
    }

    match storage.remove_member(ctx.classroom.id, member.user.id).await {
        Ok(_) => {
            info!(
                "User {} removed from classroom {} by user {}",
                member.user.id, ctx.classroom.id, ctx.membership.user_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Member removed successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::MemberRemoveFailed,
            format!("Failed to remove member: {e}"),
        )),
    }
}
