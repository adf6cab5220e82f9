use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::models::user_classrooms::requests::{
    MemberListQuery, UpdateMemberRoleRequest, UpdateMemberTeamRequest,
};
use crate::services::MemberService;

static MEMBER_SERVICE: Lazy<MemberService> = Lazy::new(MemberService::new_lazy);

pub async fn list_members(
    req: HttpRequest,
    query: web::Query<MemberListQuery>,
) -> ActixResult<HttpResponse> {
    MEMBER_SERVICE.list_members(&req, query.into_inner()).await
}

pub async fn get_member(req: HttpRequest) -> ActixResult<HttpResponse> {
    MEMBER_SERVICE.get_member(&req).await
}

pub async fn update_member_role(
    req: HttpRequest,
    body: web::Json<UpdateMemberRoleRequest>,
) -> ActixResult<HttpResponse> {
    MEMBER_SERVICE
        .update_member_role(&req, body.into_inner())
        .await
}

pub async fn update_member_team(
    req: HttpRequest,
    body: web::Json<UpdateMemberTeamRequest>,
) -> ActixResult<HttpResponse> {
    MEMBER_SERVICE
        .update_member_team(&req, body.into_inner())
        .await
}

pub async fn remove_member(req: HttpRequest) -> ActixResult<HttpResponse> {
    MEMBER_SERVICE.remove_member(&req).await
}

// 挂在 /api/v1/classrooms/{classroom_id} 下
pub fn configure_member_routes(cfg: &mut web::ServiceConfig) {
    let viewable = || RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable]);

    cfg.route("/members", web::get().to(list_members).wrap(viewable()))
        .service(
            web::scope("/members/{member_id}")
                .wrap(ResolveResource::new(ResourceKind::Member))
                .service(
                    web::resource("")
                        .route(web::get().to(get_member).wrap(viewable()))
                        // 所有者移除成员，或成员自己退出
                        .route(web::delete().to(remove_member).wrap(viewable())),
                )
                .route(
                    "/role",
                    web::put().to(update_member_role).wrap(RequireClassroomPolicy::new(&[
                        ClassroomPolicy::Viewable,
                        ClassroomPolicy::Owner,
                        ClassroomPolicy::NotArchived,
                    ])),
                )
                .route(
                    "/team",
                    web::put().to(update_member_team).wrap(RequireClassroomPolicy::new(&[
                        ClassroomPolicy::Viewable,
                        ClassroomPolicy::OwnerOrModerator,
                        ClassroomPolicy::NotArchived,
                    ])),
                ),
        );
}
