use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::invitations::requests::CreateInvitationsRequest;
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::{InvitationService, bad_request};
use crate::utils::parse_uuid;

static INVITATION_SERVICE: Lazy<InvitationService> = Lazy::new(InvitationService::new_lazy);

pub async fn create_invitations(
    req: HttpRequest,
    body: web::Json<CreateInvitationsRequest>,
) -> ActixResult<HttpResponse> {
    INVITATION_SERVICE
        .create_invitations(&req, body.into_inner())
        .await
}

pub async fn list_invitations(req: HttpRequest) -> ActixResult<HttpResponse> {
    INVITATION_SERVICE.list_invitations(&req).await
}

pub async fn revoke_invitation(req: HttpRequest) -> ActixResult<HttpResponse> {
    INVITATION_SERVICE.revoke_invitation(&req).await
}

pub async fn view_invitation(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    match parse_uuid(&path) {
        Some(id) => INVITATION_SERVICE.view_invitation(&req, id).await,
        None => Ok(bad_request("Missing or invalid invitation_id")),
    }
}

pub async fn accept_invitation(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    match parse_uuid(&path) {
        Some(id) => INVITATION_SERVICE.accept_invitation(&req, id).await,
        None => Ok(bad_request("Missing or invalid invitation_id")),
    }
}

pub async fn reject_invitation(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    match parse_uuid(&path) {
        Some(id) => INVITATION_SERVICE.reject_invitation(&req, id).await,
        None => Ok(bad_request("Missing or invalid invitation_id")),
    }
}

// 挂在 /api/v1/classrooms/{classroom_id} 下，仅管理者可用
pub fn configure_classroom_invitation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invitations")
            .route(
                web::get()
                    .to(list_invitations)
                    .wrap(RequireClassroomPolicy::manager()),
            )
            .route(
                web::post()
                    .to(create_invitations)
                    .wrap(RequireClassroomPolicy::new(&[
                        ClassroomPolicy::Viewable,
                        ClassroomPolicy::OwnerOrModerator,
                        ClassroomPolicy::NotArchived,
                    ])),
            ),
    )
    .service(
        web::resource("/invitations/{invitation_id}")
            .wrap(ResolveResource::new(ResourceKind::Invitation))
            .route(
                web::delete()
                    .to(revoke_invitation)
                    .wrap(RequireClassroomPolicy::manager()),
            ),
    );
}

// 受邀者使用的路由：只需要登录，受邀者还不是课堂成员
pub fn configure_invitation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/invitations/{invitation_id}")
            .wrap(middlewares::RequireSession)
            .route("", web::get().to(view_invitation))
            .route("/accept", web::post().to(accept_invitation))
            .route("/reject", web::post().to(reject_invitation)),
    );
}
