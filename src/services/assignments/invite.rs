use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashSet;
use tracing::{info, warn};

use super::AssignmentService;
use crate::errors::GitClassroomsError;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{entities::Assignment, requests::InviteTeamsRequest},
    user_classrooms::entities::Role,
};
use crate::services::{
    bad_request, classroom_context, get_mailer, internal_error, require_extension,
};

/// 为团队建立待接受的项目并通知团队成员；已被邀请的团队跳过
pub async fn invite_teams(
    service: &AssignmentService,
    request: &HttpRequest,
    body: InviteTeamsRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, assignment) = match (
        classroom_context(request),
        require_extension::<Assignment>(request, "assignment"),
    ) {
        (Ok(ctx), Ok(assignment)) => (ctx, assignment),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if assignment.closed {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AssignmentClosed,
            "assignment is closed",
        )));
    }
    let storage = service.get_storage(request);

    let teams = match storage.list_teams(ctx.classroom.id).await {
        Ok(teams) => teams,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to load teams: {e}"),
            ));
        }
    };
    let team_ids = body
        .team_ids
        .unwrap_or_else(|| teams.iter().map(|t| t.team.id).collect());

    let created = match storage
        .create_assignment_projects(assignment.id, &team_ids)
        .await
    {
        Ok(created) => created,
        Err(GitClassroomsError::Validation(msg)) => return Ok(bad_request(msg)),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to invite teams: {e}"),
            ));
        }
    };

    let invited: HashSet<_> = created.iter().map(|p| p.team_id).collect();
    let recipients: Vec<String> = teams
        .iter()
        .filter(|t| invited.contains(&t.team.id))
        .flat_map(|t| t.members.iter())
        .filter(|m| m.role == Role::Student && !m.user.email.is_empty())
        .map(|m| m.user.email.clone())
        .collect();
    if !recipients.is_empty()
        && let Err(e) = get_mailer(request)
            .send_assignment_notification(&ctx.classroom, &assignment, &recipients)
            .await
    {
        warn!(
            "Failed to notify teams about assignment {}: {}",
            assignment.id, e
        );
    }

    info!(
        "Assignment {}: invited {} teams",
        assignment.id,
        created.len()
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        created,
        "Teams invited successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn invites_all_teams_once_and_mails_students() {
        let fx = Fixture::new().await;
        fx.team("red", &[11, 12]).await;
        fx.team("blue", &[13]).await;
        let assignment = fx.assignment(None).await;

        for expected in [2, 0] {
            let req = fx.owner_request().await;
            req.extensions_mut().insert(assignment.clone());
            let resp = invite_teams(
                &AssignmentService::new_lazy(),
                &req,
                InviteTeamsRequest::default(),
            )
            .await
            .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["data"].as_array().unwrap().len(), expected);
        }
        assert_eq!(
            fx.storage
                .list_assignment_projects(assignment.id)
                .await
                .unwrap()
                .len(),
            2
        );
        let sent = fx.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 3);
        assert!(sent.contains(&"user13@example.org".to_string()));
    }

    #[actix_web::test]
    async fn closed_assignment_cannot_be_distributed() {
        let fx = Fixture::new().await;
        let mut assignment = fx.assignment(None).await;
        assignment.closed = true;
        let req = fx.owner_request().await;
        req.extensions_mut().insert(assignment);

        let resp = invite_teams(
            &AssignmentService::new_lazy(),
            &req,
            InviteTeamsRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
