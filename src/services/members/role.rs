use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::MemberService;
use crate::models::{
    ApiResponse, ErrorCode,
    user_classrooms::{
        entities::{ClassroomMember, Role},
        requests::UpdateMemberRoleRequest,
    },
};
use crate::services::{bad_request, classroom_context, internal_error, require_extension};

/// 创建者的角色固定为 Owner，也不能把别人设为 Owner
pub async fn update_member_role(
    service: &MemberService,
    request: &HttpRequest,
    body: UpdateMemberRoleRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, member) = match (
        classroom_context(request),
        require_extension::<ClassroomMember>(request, "member"),
    ) {
        (Ok(ctx), Ok(member)) => (ctx, member),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if member.role == Role::Owner {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassroomPermissionDenied,
            "the owner's role cannot be changed",
        )));
    }
    if body.role == Role::Owner {
        return Ok(bad_request("a classroom has exactly one owner"));
    }
    let storage = service.get_storage(request);

    match storage
        .update_member_role(ctx.classroom.id, member.user.id, body.role)
        .await
    {
        Ok(Some(updated)) => {
            info!(
                "Classroom {}: user {} is now {}",
                ctx.classroom.id, member.user.id, updated.role
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                updated,
                "Member role updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::MemberNotFound,
            "member not found",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::MemberUpdateFailed,
            format!("Failed to update member role: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, OWNER_ID, body_json};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    async fn member(fx: &Fixture, id: i64) -> ClassroomMember {
        fx.storage
            .get_member(fx.classroom.id, id)
            .await
            .unwrap()
            .unwrap()
    }

    #[actix_web::test]
    async fn promotes_student_to_moderator() {
        let fx = Fixture::new().await;
        fx.member(11, Role::Student).await;
        let req = fx.owner_request().await;
        req.extensions_mut().insert(member(&fx, 11).await);

        let resp = update_member_role(
            &MemberService::new_lazy(),
            &req,
            UpdateMemberRoleRequest {
                role: Role::Moderator,
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["role"], "moderator");
        assert_eq!(member(&fx, 11).await.role, Role::Moderator);
    }

    #[actix_web::test]
    async fn owner_row_and_owner_role_are_protected() {
        let fx = Fixture::new().await;
        fx.member(11, Role::Student).await;

        let req = fx.owner_request().await;
        req.extensions_mut().insert(member(&fx, OWNER_ID).await);
        let resp = update_member_role(
            &MemberService::new_lazy(),
            &req,
            UpdateMemberRoleRequest {
                role: Role::Student,
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = fx.owner_request().await;
        req.extensions_mut().insert(member(&fx, 11).await);
        let resp = update_member_role(
            &MemberService::new_lazy(),
            &req,
            UpdateMemberRoleRequest { role: Role::Owner },
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(member(&fx, 11).await.role, Role::Student);
    }
}
