use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassroomService;
use crate::models::{ApiResponse, ErrorCode, classrooms::requests::UpdateClassroomRequest};
use crate::services::{bad_request, classroom_context, gitlab_error};

pub async fn update_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
    body: UpdateClassroomRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    if let Err(msg) = body.validate() {
        return Ok(bad_request(msg));
    }
    let storage = service.get_storage(request);
    let group_id = ctx.classroom.gitlab_group_id;

    // GitLab 组先改名，本地记录随后更新
    if let Err(e) = ctx.gitlab.change_group_name(group_id, &body.name).await {
        return Ok(gitlab_error("Failed to rename GitLab group", &e));
    }
    if let Err(e) = ctx
        .gitlab
        .change_group_description(group_id, &body.description)
        .await
    {
        return Ok(gitlab_error("Failed to update GitLab group description", &e));
    }

    match storage
        .update_classroom(ctx.classroom.id, &body.name, &body.description)
        .await
    {
        Ok(Some(classroom)) => {
            info!("Classroom {} renamed to '{}'", classroom.id, classroom.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                classroom,
                "Classroom updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassroomNotFound,
            "classroom not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::ClassroomUpdateFailed,
                format!("Classroom update failed: {e}"),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn empty_body_is_rejected_with_literal_message() {
        let fx = Fixture::new().await;
        let req = fx.owner_request().await;

        let resp = update_classroom(
            &ClassroomService::new_lazy(),
            &req,
            UpdateClassroomRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "request requires name and description");
        assert_eq!(fx.fake.count("change_group_name"), 0);
    }

    #[actix_web::test]
    async fn renames_group_and_classroom() {
        let fx = Fixture::new().await;
        let req = fx.owner_request().await;

        let resp = update_classroom(
            &ClassroomService::new_lazy(),
            &req,
            UpdateClassroomRequest {
                name: "SE 2".into(),
                description: "Summer term".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.fake.count("change_group_name"), 1);
        assert_eq!(fx.fake.count("change_group_description"), 1);
        let stored = fx.reload_classroom().await;
        assert_eq!(stored.name, "SE 2");
        assert_eq!(stored.description, "Summer term");
    }
}
