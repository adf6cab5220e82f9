use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use super::ProjectService;
use crate::models::{
    ApiResponse, ErrorCode, grading::requests::UpdateGradingResultsRequest,
    projects::entities::AssignmentProject,
};
use crate::services::{internal_error, require_extension};

/// 人工评分：每条结果必须对应作业挂载的细则，按 (细则, 项目) 覆盖写入
pub async fn update_grading_results(
    service: &ProjectService,
    request: &HttpRequest,
    body: UpdateGradingResultsRequest,
) -> ActixResult<HttpResponse> {
    let project = match require_extension::<AssignmentProject>(request, "project") {
        Ok(project) => project,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let rubrics = match storage.list_assignment_rubrics(project.assignment_id).await {
        Ok(rubrics) => rubrics,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::GradingFailed,
                format!("Failed to load rubrics: {e}"),
            ));
        }
    };
    if let Err((code, message)) = body.validate(&rubrics) {
        return Ok(ApiResponse::error_response(
            StatusCode::BAD_REQUEST,
            code,
            message,
        ));
    }

    match storage.upsert_grading_results(project.id, &body.results).await {
        Ok(results) => {
            info!(
                "Project {}: {} grading results stored",
                project.id,
                results.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                results,
                "Grading results updated successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::GradingFailed,
            format!("Failed to store grading results: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading::requests::{GradingResultInput, RubricRequest};
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;

    #[actix_web::test]
    async fn scores_are_validated_and_overwritten() {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11]).await;
        let assignment = fx.assignment(None).await;
        let project = fx.accepted_project(&assignment, &red, 900).await;
        let rubric = fx
            .storage
            .create_rubric(
                fx.classroom.id,
                &RubricRequest {
                    name: "Style".into(),
                    description: String::new(),
                    max_score: 5,
                },
            )
            .await
            .unwrap();
        fx.storage
            .set_assignment_rubrics(assignment.id, &[rubric.id])
            .await
            .unwrap();
        let service = ProjectService::new_lazy();
        let grade = |score| UpdateGradingResultsRequest {
            results: vec![GradingResultInput {
                rubric_id: rubric.id,
                score,
                feedback: Some("ok".into()),
            }],
        };

        let req = fx.owner_request().await;
        req.extensions_mut().insert(project.clone());
        let resp = update_grading_results(&service, &req, grade(6)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["code"],
            ErrorCode::ScoreOutOfRange as i32
        );

        for score in [3, 4] {
            let req = fx.owner_request().await;
            req.extensions_mut().insert(project.clone());
            let resp = update_grading_results(&service, &req, grade(score))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let stored = fx.storage.list_grading_results(project.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].score, 4);
    }
}
