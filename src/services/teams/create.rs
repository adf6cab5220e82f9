use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::TeamService;
use super::join::enter_team;
use crate::gitlab::GitLabError;
use crate::models::{
    ApiResponse, ErrorCode,
    teams::requests::TeamNameRequest,
    user_classrooms::policies::is_student,
};
use crate::services::{bad_request, classroom_context, gitlab_error, internal_error};
use crate::utils::Compensator;

pub async fn create_team(
    service: &TeamService,
    request: &HttpRequest,
    body: TeamNameRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let name = match body.validate() {
        Ok(name) => name.to_string(),
        Err(msg) => return Ok(bad_request(msg)),
    };
    let student = is_student(&ctx.membership);
    if student {
        if !ctx.classroom.create_teams {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::ClassroomPermissionDenied,
                "students cannot create teams in this classroom",
            )));
        }
        if ctx.membership.team_id.is_some() {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::AlreadyInTeam,
                "you are already in a team",
            )));
        }
    }
    let storage = service.get_storage(request);

    match storage.count_teams(ctx.classroom.id).await {
        Ok(count) if ctx.classroom.team_limit_reached(count) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TeamLimitReached,
                format!("classroom allows at most {} teams", ctx.classroom.max_teams),
            )));
        }
        Ok(_) => {}
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::TeamCreationFailed,
                format!("Failed to count teams: {e}"),
            ));
        }
    }

    let mut saga: Compensator<GitLabError> = Compensator::new(format!("create team '{name}'"));
    let group = match ctx
        .gitlab
        .create_sub_group(&name, ctx.classroom.gitlab_group_id, "")
        .await
    {
        Ok(group) => group,
        Err(e) => return Ok(gitlab_error("Failed to create team subgroup", &e)),
    };
    let undo = ctx.gitlab.clone();
    let group_id = group.id;
    saga.record("create subgroup", move || async move {
        undo.delete_group(group_id).await
    });

    let team = match storage
        .create_team(ctx.classroom.id, &name, group.id, &group.web_url)
        .await
    {
        Ok(team) => team,
        Err(e) => {
            error!("Failed to persist team: {}", e);
            saga.rollback().await;
            return Ok(internal_error(
                ErrorCode::TeamCreationFailed,
                format!("Team creation failed: {e}"),
            ));
        }
    };

    if student
        && let Err(resp) =
            enter_team(storage.as_ref(), &ctx, &team, ctx.membership.user_id).await
    {
        if let Err(e) = storage.delete_team(team.id).await {
            error!("Failed to remove team {} after join failure: {}", team.id, e);
        }
        saga.rollback().await;
        return Ok(resp);
    }
    saga.commit();

    info!(
        "Team {} created in classroom {} by user {}",
        team.id, ctx.classroom.id, ctx.membership.user_id
    );
    Ok(HttpResponse::Created()
        .insert_header((
            "Location",
            format!("/api/v1/classrooms/{}/teams/{}", ctx.classroom.id, team.id),
        ))
        .json(ApiResponse::success(team, "Team created successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::AccessLevel;
    use crate::models::user_classrooms::entities::Role;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    fn named(name: &str) -> TeamNameRequest {
        TeamNameRequest {
            name: name.to_string(),
        }
    }

    #[actix_web::test]
    async fn student_creator_joins_the_new_team() {
        let fx = Fixture::new().await;
        fx.member(11, Role::Student).await;
        let req = fx.request_as(11).await;

        let resp = create_team(&TeamService::new_lazy(), &req, named("  red  "))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["name"], "red");
        let group_id = body["data"]["group_id"].as_i64().unwrap();
        assert_eq!(
            fx.fake.group_member_level(group_id, 11),
            Some(AccessLevel::Reporter)
        );
        let membership = fx
            .storage
            .get_membership(fx.classroom.id, 11)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            membership.team_id.map(|id| id.to_string()),
            body["data"]["id"].as_str().map(str::to_string)
        );
    }

    #[actix_web::test]
    async fn owner_creates_without_joining() {
        let fx = Fixture::new().await;
        let req = fx.owner_request().await;
        let resp = create_team(&TeamService::new_lazy(), &req, named("blue"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(fx.fake.count("add_user_to_group"), 0);
    }

    #[actix_web::test]
    async fn failed_join_removes_team_and_subgroup() {
        let fx = Fixture::new().await;
        fx.member(11, Role::Student).await;
        fx.fake.fail_on("add_user_to_group", 1);
        let req = fx.request_as(11).await;

        let resp = create_team(&TeamService::new_lazy(), &req, named("red"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fx.fake.count("delete_group"), 1);
        assert!(fx.storage.list_teams(fx.classroom.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn team_limit_is_enforced() {
        let fx = Fixture::new().await;
        fx.team("red", &[]).await;
        let req = fx.owner_request().await;
        // 课堂只允许一个团队
        let mut limited = crate::middlewares::ClassroomContext::extract(&req).unwrap();
        limited.classroom.max_teams = 1;
        req.extensions_mut().insert(limited);

        let resp = create_team(&TeamService::new_lazy(), &req, named("blue"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(resp).await["code"],
            ErrorCode::TeamLimitReached as i32
        );
    }
}
