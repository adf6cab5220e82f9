use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeamService;
use crate::models::{
    ApiResponse, ErrorCode,
    teams::{entities::Team, requests::TeamNameRequest},
};
use crate::services::{
    bad_request, classroom_context, gitlab_error, internal_error, require_extension,
};

/// 先改 GitLab 子组名称，再改本地记录
pub async fn rename_team(
    service: &TeamService,
    request: &HttpRequest,
    body: TeamNameRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, team) = match (
        classroom_context(request),
        require_extension::<Team>(request, "team"),
    ) {
        (Ok(ctx), Ok(team)) => (ctx, team),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let name = match body.validate() {
        Ok(name) => name,
        Err(msg) => return Ok(bad_request(msg)),
    };
    let storage = service.get_storage(request);

    if let Err(e) = ctx.gitlab.change_group_name(team.group_id, name).await {
        return Ok(gitlab_error("Failed to rename team subgroup", &e));
    }

    match storage.rename_team(team.id, name).await {
        Ok(Some(updated)) => {
            info!("Team {} renamed to '{}'", team.id, updated.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                updated,
                "Team renamed successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::TeamNotFound,
            "team not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::TeamUpdateFailed,
            format!("Failed to rename team: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;

    #[actix_web::test]
    async fn renames_subgroup_and_record() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[]).await;
        let req = fx.owner_request().await;
        req.extensions_mut().insert(red.clone());

        let body = body_json(
            rename_team(
                &TeamService::new_lazy(),
                &req,
                TeamNameRequest {
                    name: "crimson".into(),
                },
            )
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["name"], "crimson");
        assert_eq!(
            fx.fake.calls().last().unwrap().detail,
            format!("{}:crimson", red.group_id)
        );
    }
}
