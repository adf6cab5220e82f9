use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::error;

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{entities::Assignment, requests::UpdateAssignmentRequest},
};
use crate::services::{
    access_levels, bad_request, classroom_context, internal_error, require_extension,
};

pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    body: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, assignment) = match (
        classroom_context(request),
        require_extension::<Assignment>(request, "assignment"),
    ) {
        (Ok(ctx), Ok(assignment)) => (ctx, assignment),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Ok(bad_request("assignment name must not be empty"));
    }
    let storage = service.get_storage(request);

    // 已有团队接受后名称和描述不可再改
    if body.changes_text() {
        match storage.assignment_has_accepted_projects(assignment.id).await {
            Ok(false) => {}
            Ok(true) => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::AssignmentLocked,
                    "name and description cannot change after a team accepted the assignment",
                )));
            }
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::AssignmentUpdateFailed,
                    format!("Assignment update failed: {e}"),
                ));
            }
        }
    }

    let reopens = assignment.closed && body.due_date.is_some_and(|due| due > Utc::now());
    let updated = if reopens {
        access_levels::reopen_assignment(storage.as_ref(), &ctx.gitlab, &assignment, &body).await
    } else {
        storage.update_assignment(assignment.id, &body).await
    };

    match updated {
        Ok(Some(assignment)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            assignment,
            "Assignment updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "assignment not found",
        ))),
        Err(e) => {
            error!("Updating assignment {} failed: {}", assignment.id, e);
            Ok(internal_error(
                ErrorCode::AssignmentUpdateFailed,
                format!("Assignment update failed: {e}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::AccessLevel;
    use crate::models::user_classrooms::entities::Role;
    use crate::services::test_support::Fixture;
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;
    use chrono::Duration;

    struct Closed {
        fx: Fixture,
        assignment: Assignment,
    }

    /// 已关闭的作业：red 团队 (11, 12) 与 blue 团队 (13) 已接受，学生都是 Reporter；
    /// 12 在项目中是 Owner
    async fn closed_assignment() -> Closed {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11, 12]).await;
        let blue = fx.team("blue", &[13]).await;
        let assignment = fx.assignment(Some(Utc::now() - Duration::days(1))).await;
        fx.accepted_project(&assignment, &red, 900).await;
        fx.accepted_project(&assignment, &blue, 901).await;
        fx.storage
            .set_assignment_closed(assignment.id, true)
            .await
            .unwrap();
        fx.fake.set_access_level(900, 11, AccessLevel::Reporter);
        fx.fake.set_access_level(900, 12, AccessLevel::Owner);
        fx.fake.set_access_level(901, 13, AccessLevel::Reporter);
        let assignment = fx
            .storage
            .get_assignment(fx.classroom.id, assignment.id)
            .await
            .unwrap()
            .unwrap();
        Closed { fx, assignment }
    }

    async fn request(c: &Closed) -> HttpRequest {
        let req = c.fx.owner_request().await;
        req.extensions_mut().insert(c.assignment.clone());
        req
    }

    fn move_due_date_forward() -> UpdateAssignmentRequest {
        UpdateAssignmentRequest {
            due_date: Some(Utc::now() + Duration::days(7)),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn future_due_date_reopens_and_restores_developer() {
        let c = closed_assignment().await;
        let resp = update_assignment(
            &AssignmentService::new_lazy(),
            &request(&c).await,
            move_due_date_forward(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(c.fx.fake.access_level(900, 11), AccessLevel::Developer);
        assert_eq!(c.fx.fake.access_level(900, 12), AccessLevel::Owner);
        assert_eq!(c.fx.fake.access_level(901, 13), AccessLevel::Developer);
        let stored = c
            .fx
            .storage
            .get_assignment(c.fx.classroom.id, c.assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.closed);
        assert!(stored.due_date.unwrap() > Utc::now());
    }

    #[actix_web::test]
    async fn failed_regrant_rolls_back_and_stays_closed() {
        let c = closed_assignment().await;
        // 第一次修改恢复 11，第二次（13）失败
        c.fx.fake.fail_on("change_user_access_level_in_project", 2);

        let resp = update_assignment(
            &AssignmentService::new_lazy(),
            &request(&c).await,
            move_due_date_forward(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(c.fx.fake.access_level(900, 11), AccessLevel::Reporter);
        assert_eq!(c.fx.fake.access_level(901, 13), AccessLevel::Reporter);
        let stored = c
            .fx
            .storage
            .get_assignment(c.fx.classroom.id, c.assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.closed);
        assert!(stored.due_date.unwrap() < Utc::now());
    }

    #[actix_web::test]
    async fn text_is_locked_after_acceptance() {
        let c = closed_assignment().await;
        let resp = update_assignment(
            &AssignmentService::new_lazy(),
            &request(&c).await,
            UpdateAssignmentRequest {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(c.fx.fake.count("change_user_access_level_in_project"), 0);
    }

    #[actix_web::test]
    async fn moderator_can_edit_open_assignment() {
        let fx = Fixture::new().await;
        fx.member(5, Role::Moderator).await;
        let assignment = fx.assignment(None).await;
        let req = fx.request_as(5).await;
        req.extensions_mut().insert(assignment.clone());

        let resp = update_assignment(
            &AssignmentService::new_lazy(),
            &req,
            UpdateAssignmentRequest {
                description: Some("updated".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let stored = fx
            .storage
            .get_assignment(fx.classroom.id, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.description, "updated");
        assert_eq!(stored.name, "Lab 1");
    }
}
