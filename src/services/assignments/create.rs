use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::info;

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::requests::{CreateAssignmentRequest, NewAssignment},
};
use crate::services::{bad_request, classroom_context, gitlab_error, internal_error, user_gitlab};

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    body: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, gitlab) = match (classroom_context(request), user_gitlab(request)) {
        (Ok(ctx), Ok(gitlab)) => (ctx, gitlab),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if let Err(msg) = body.validate(Utc::now()) {
        return Ok(bad_request(msg));
    }
    let storage = service.get_storage(request);

    // 模板项目必须对创建者可见
    match gitlab.get_project_by_id(body.template_project_id).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() || e.is_forbidden() => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::TemplateProjectNotFound,
                format!("template project {} not found", body.template_project_id),
            )));
        }
        Err(e) => return Ok(gitlab_error("Failed to load template project", &e)),
    }

    let new_assignment = NewAssignment {
        classroom_id: ctx.classroom.id,
        template_project_id: body.template_project_id,
        name: body.name.trim().to_string(),
        description: body.description,
        due_date: body.due_date,
        enable_junit_grading: body.enable_junit_grading,
    };

    match storage.create_assignment(new_assignment).await {
        Ok(assignment) => {
            info!(
                "Assignment {} created in classroom {}",
                assignment.id, ctx.classroom.id
            );
            Ok(HttpResponse::Created()
                .insert_header((
                    "Location",
                    format!(
                        "/api/v1/classrooms/{}/assignments/{}",
                        ctx.classroom.id, assignment.id
                    ),
                ))
                .json(ApiResponse::success(
                    assignment,
                    "Assignment created successfully",
                )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::AssignmentCreationFailed,
            format!("Assignment creation failed: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::GitLabProject;
    use crate::services::test_support::Fixture;
    use actix_web::http::StatusCode;

    fn body(template_project_id: i64) -> CreateAssignmentRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Lab 2",
            "description": "linked lists",
            "template_project_id": template_project_id,
        }))
        .unwrap()
    }

    #[actix_web::test]
    async fn unknown_template_is_a_bad_request() {
        let fx = Fixture::new().await;
        let req = fx.owner_request().await;
        let resp = create_assignment(&AssignmentService::new_lazy(), &req, body(4242))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn creates_with_location() {
        let fx = Fixture::new().await;
        fx.fake.add_project(GitLabProject {
            id: 4242,
            name: "template".into(),
            description: None,
            path_with_namespace: "course/template".into(),
            web_url: "https://gitlab.test/course/template".into(),
            default_branch: Some("main".into()),
        });
        let req = fx.owner_request().await;
        let resp = create_assignment(&AssignmentService::new_lazy(), &req, body(4242))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp.headers().get("Location").unwrap().to_str().unwrap();
        assert!(location.starts_with(&format!(
            "/api/v1/classrooms/{}/assignments/",
            fx.classroom.id
        )));
        assert_eq!(
            fx.storage
                .list_assignments(fx.classroom.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
