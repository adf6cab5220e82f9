use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Duration, Utc};
use tracing::{error, info};

use super::ClassroomService;
use crate::config::AppConfig;
use crate::gitlab::{AccessLevel, GitLabError};
use crate::models::{
    ApiResponse, ErrorCode,
    classrooms::requests::{CreateClassroomRequest, NewClassroom},
};
use crate::services::{bad_request, current_user, gitlab_error, internal_error, user_gitlab};
use crate::utils::Compensator;

pub(crate) const GROUP_TOKEN_NAME: &str = "gitclassrooms";

pub async fn create_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
    body: CreateClassroomRequest,
) -> ActixResult<HttpResponse> {
    let (user, gitlab) = match (current_user(request), user_gitlab(request)) {
        (Ok(user), Ok(gitlab)) => (user, gitlab),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if let Err(msg) = body.validate() {
        return Ok(bad_request(msg));
    }
    let storage = service.get_storage(request);

    // 先建组，再建组访问令牌；之后任何一步失败都删除新建的组
    let mut saga: Compensator<GitLabError> =
        Compensator::new(format!("create classroom '{}'", body.name));

    let group = match gitlab.create_group(&body.name, &body.description).await {
        Ok(group) => group,
        Err(e) => return Ok(gitlab_error("Failed to create GitLab group", &e)),
    };
    let undo = gitlab.clone();
    let group_id = group.id;
    saga.record("create group", move || async move {
        undo.delete_group(group_id).await
    });

    let lifetime_days = AppConfig::get().gitlab.token_lifetime_days;
    let expires_at = (Utc::now() + Duration::days(lifetime_days)).date_naive();
    let token = match gitlab
        .create_group_access_token(group.id, GROUP_TOKEN_NAME, AccessLevel::Owner, expires_at)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            saga.rollback().await;
            return Ok(gitlab_error("Failed to create group access token", &e));
        }
    };

    let new_classroom = NewClassroom {
        name: body.name,
        description: body.description,
        owner_id: user.id,
        gitlab_group_id: group.id,
        gitlab_web_url: group.web_url,
        group_access_token_id: token.id,
        group_access_token: token.token,
        create_teams: body.create_teams,
        max_team_size: body.max_team_size,
        max_teams: body.max_teams,
        students_view_all_projects: body.students_view_all_projects,
    };

    match storage.create_classroom(new_classroom).await {
        Ok(classroom) => {
            saga.commit();
            info!(
                "Classroom {} created by user {} on GitLab group {}",
                classroom.id, user.id, classroom.gitlab_group_id
            );
            Ok(HttpResponse::Created()
                .insert_header((
                    "Location",
                    format!("/api/v1/classrooms/owned/{}", classroom.id),
                ))
                .json(ApiResponse::success(
                    classroom,
                    "Classroom created successfully",
                )))
        }
        Err(e) => {
            error!("Failed to persist classroom: {}", e);
            saga.rollback().await;
            Ok(internal_error(
                ErrorCode::ClassroomCreationFailed,
                format!("Classroom creation failed: {e}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, OWNER_ID, body_json};
    use actix_web::http::StatusCode;

    fn request_body(name: &str) -> CreateClassroomRequest {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "description": "Spring term",
            "max_team_size": 3,
        }))
        .unwrap()
    }

    #[actix_web::test]
    async fn creates_group_then_token_and_persists_both() {
        let fx = Fixture::new().await;
        let before = fx.fake.ops().len();
        let req = fx.user_request(OWNER_ID).await;

        let resp = create_classroom(&ClassroomService::new_lazy(), &req, request_body("OS"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();

        let ops = fx.fake.ops()[before..].to_vec();
        assert_eq!(ops, vec!["create_group", "create_group_access_token"]);

        let body = body_json(resp).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/api/v1/classrooms/owned/{id}"));

        let stored = fx
            .storage
            .get_classroom_by_id(id.parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        let group_id = body["data"]["gitlab_group_id"].as_i64().unwrap();
        assert_eq!(stored.gitlab_group_id, group_id);
        assert_eq!(
            stored.group_access_token,
            format!("glpat-fake-{}", stored.group_access_token_id)
        );
        assert_eq!(stored.max_team_size, 3);
        // 令牌不出现在响应中
        assert!(body["data"].get("group_access_token").is_none());
    }

    #[actix_web::test]
    async fn token_failure_deletes_the_new_group() {
        let fx = Fixture::new().await;
        fx.fake.fail_on("create_group_access_token", 1);
        let req = fx.user_request(OWNER_ID).await;

        let resp = create_classroom(&ClassroomService::new_lazy(), &req, request_body("OS"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fx.fake.count("delete_group"), 1);
        let body = body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("injected failure"));
    }

    #[actix_web::test]
    async fn empty_name_is_rejected() {
        let fx = Fixture::new().await;
        let req = fx.user_request(OWNER_ID).await;
        let resp = create_classroom(&ClassroomService::new_lazy(), &req, request_body(""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fx.fake.count("create_group"), 1);
    }
}
