use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::RubricService;
use crate::models::{
    ApiResponse, ErrorCode,
    grading::{entities::ManualGradingRubric, requests::RubricRequest},
};
use crate::services::{bad_request, internal_error, require_extension};

pub async fn update_rubric(
    service: &RubricService,
    request: &HttpRequest,
    body: RubricRequest,
) -> ActixResult<HttpResponse> {
    let rubric = match require_extension::<ManualGradingRubric>(request, "rubric") {
        Ok(rubric) => rubric,
        Err(resp) => return Ok(resp),
    };
    if let Err(msg) = body.validate() {
        return Ok(bad_request(msg));
    }
    let storage = service.get_storage(request);

    match storage.update_rubric(rubric.id, &body).await {
        Ok(Some(updated)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Rubric updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::RubricNotFound,
            "rubric not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::GradingFailed,
            format!("Failed to update rubric: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;

    #[actix_web::test]
    async fn updates_max_score() {
        let fx = Fixture::new().await;
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

        let req = fx.owner_request().await;
        req.extensions_mut().insert(rubric);
        let body = body_json(
            update_rubric(
                &RubricService::new_lazy(),
                &req,
                RubricRequest {
                    name: "Style".into(),
                    description: "clippy clean".into(),
                    max_score: 8,
                },
            )
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["max_score"], 8);
        assert_eq!(body["data"]["description"], "clippy clean");
    }
}
