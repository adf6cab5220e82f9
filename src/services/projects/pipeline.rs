use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProjectService;
use crate::gitlab::GitLabError;
use crate::models::{
    ApiResponse, ErrorCode,
    projects::{entities::AssignmentProject, responses::PipelineResponse},
};
use crate::services::{classroom_context, gitlab_error, require_extension};

fn no_pipeline() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::PipelineNotFound,
        "no pipeline yet",
    ))
}

// 没有流水线时 GitLab 返回 404，项目未启用 CI 时返回 403
fn missing(e: &GitLabError) -> bool {
    e.is_not_found() || e.is_forbidden()
}

pub async fn get_pipeline(
    _service: &ProjectService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, project) = match (
        classroom_context(request),
        require_extension::<AssignmentProject>(request, "project"),
    ) {
        (Ok(ctx), Ok(project)) => (ctx, project),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    let Some(gitlab_project_id) = project.gitlab_project_id else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ProjectNotAccepted,
            "project has not been accepted yet",
        )));
    };

    let pipeline = match ctx
        .gitlab
        .get_project_latest_pipeline(gitlab_project_id, None)
        .await
    {
        Ok(pipeline) => pipeline,
        Err(e) if missing(&e) => return Ok(no_pipeline()),
        Err(e) => return Ok(gitlab_error("Failed to load pipeline", &e)),
    };
    let test_report = match ctx
        .gitlab
        .get_project_latest_pipeline_test_report_summary(gitlab_project_id, None)
        .await
    {
        Ok(summary) => summary,
        Err(e) if missing(&e) => return Ok(no_pipeline()),
        Err(e) => return Ok(gitlab_error("Failed to load test report", &e)),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        PipelineResponse {
            pipeline,
            test_report,
        },
        "Pipeline retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::{Pipeline, TestReportSummary};
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn missing_and_forbidden_pipelines_are_not_found() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        let project = fx.accepted_project(&assignment, &red, 900).await;

        let req = fx.owner_request().await;
        req.extensions_mut().insert(project.clone());
        let resp = get_pipeline(&ProjectService::new_lazy(), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["message"], "no pipeline yet");

        fx.fake
            .fail_on_with_status("get_project_latest_pipeline", 2, 403);
        let req = fx.owner_request().await;
        req.extensions_mut().insert(project);
        let resp = get_pipeline(&ProjectService::new_lazy(), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn returns_pipeline_with_summary() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        let project = fx.accepted_project(&assignment, &red, 900).await;
        fx.fake.set_pipeline(
            900,
            Pipeline {
                id: 7,
                status: "failed".into(),
                git_ref: Some("main".into()),
                sha: None,
                web_url: "https://gitlab.test/p/900/pipelines/7".into(),
                created_at: None,
                updated_at: None,
            },
            TestReportSummary::default(),
        );

        let req = fx.request_as(11).await;
        req.extensions_mut().insert(project);
        let body = body_json(get_pipeline(&ProjectService::new_lazy(), &req).await.unwrap()).await;
        assert_eq!(body["data"]["pipeline"]["id"], 7);
        assert_eq!(body["data"]["pipeline"]["ref"], "main");
        assert_eq!(body["data"]["test_report"]["total"]["count"], 0);
    }
}
