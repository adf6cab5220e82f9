use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::teams::requests::TeamNameRequest;
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::TeamService;

static TEAM_SERVICE: Lazy<TeamService> = Lazy::new(TeamService::new_lazy);

pub async fn list_teams(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.list_teams(&req).await
}

pub async fn create_team(
    req: HttpRequest,
    body: web::Json<TeamNameRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.create_team(&req, body.into_inner()).await
}

pub async fn get_team(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.get_team(&req).await
}

pub async fn redirect_to_gitlab(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.redirect_to_gitlab(&req).await
}

pub async fn rename_team(
    req: HttpRequest,
    body: web::Json<TeamNameRequest>,
) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.rename_team(&req, body.into_inner()).await
}

pub async fn join_team(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.join_team(&req).await
}

pub async fn delete_team(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.delete_team(&req).await
}

fn manager_active() -> RequireClassroomPolicy {
    RequireClassroomPolicy::new(&[
        ClassroomPolicy::Viewable,
        ClassroomPolicy::OwnerOrModerator,
        ClassroomPolicy::NotArchived,
    ])
}

pub fn configure_team_routes(cfg: &mut web::ServiceConfig) {
    let viewable = || RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable]);

    cfg.service(
        web::resource("/teams")
            .route(web::get().to(list_teams).wrap(viewable()))
            // 学生能否建队由课堂设置决定，在处理函数中检查
            .route(
                web::post()
                    .to(create_team)
                    .wrap(RequireClassroomPolicy::new(&[
                        ClassroomPolicy::Viewable,
                        ClassroomPolicy::NotArchived,
                    ])),
            ),
    )
    .service(
        web::scope("/teams/{team_id}")
            .wrap(ResolveResource::new(ResourceKind::Team))
            .service(
                web::resource("")
                    .route(web::get().to(get_team).wrap(viewable()))
                    .route(web::put().to(rename_team).wrap(manager_active()))
                    .route(web::delete().to(delete_team).wrap(manager_active())),
            )
            .route("/gitlab", web::get().to(redirect_to_gitlab).wrap(viewable()))
            .route(
                "/join",
                web::post().to(join_team).wrap(RequireClassroomPolicy::new(&[
                    ClassroomPolicy::Viewable,
                    ClassroomPolicy::Student,
                    ClassroomPolicy::NotArchived,
                ])),
            ),
    );
}
