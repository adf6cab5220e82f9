use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeamService;
use crate::models::{
    ApiResponse, ErrorCode,
    teams::entities::{Team, TeamWithMembers},
};
use crate::services::{internal_error, redirect, require_extension};

pub async fn get_team(service: &TeamService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let team = match require_extension::<Team>(request, "team") {
        Ok(team) => team,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_team_members(team.id).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TeamWithMembers { team, members },
            "Team retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to load team members: {e}"),
        )),
    }
}

pub async fn redirect_to_gitlab(
    _service: &TeamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match require_extension::<Team>(request, "team") {
        Ok(team) => Ok(redirect(&team.gitlab_web_url)),
        Err(resp) => Ok(resp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn team_detail_lists_members_and_redirects() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11, 12]).await;

        let req = fx.owner_request().await;
        req.extensions_mut().insert(red.clone());
        let body = body_json(get_team(&TeamService::new_lazy(), &req).await.unwrap()).await;
        assert_eq!(body["data"]["name"], "red");
        assert_eq!(body["data"]["members"].as_array().unwrap().len(), 2);

        let req = fx.owner_request().await;
        req.extensions_mut().insert(red.clone());
        let resp = redirect_to_gitlab(&TeamService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get("Location").unwrap().to_str().unwrap(),
            red.gitlab_web_url
        );
    }
}
