use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireClassroomPolicy};
use crate::models::assignments::requests::ReportQuery;
use crate::models::classrooms::requests::{
    ClassroomQueryParams, CreateClassroomRequest, UpdateClassroomRequest,
};
use crate::models::common::PaginationQuery;
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::ClassroomService;

use super::{assignments, invitations, members, projects, rubrics, teams};

// 懒加载的全局 CLASSROOM_SERVICE 实例
static CLASSROOM_SERVICE: Lazy<ClassroomService> = Lazy::new(ClassroomService::new_lazy);

// HTTP处理程序
pub async fn list_classrooms(
    req: HttpRequest,
    query: web::Query<ClassroomQueryParams>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .list_classrooms(&req, query.into_inner())
        .await
}

pub async fn create_classroom(
    req: HttpRequest,
    body: web::Json<CreateClassroomRequest>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .create_classroom(&req, body.into_inner())
        .await
}

pub async fn list_owned_classrooms(
    req: HttpRequest,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .list_owned_classrooms(&req, query.into_inner())
        .await
}

pub async fn get_owned_classroom(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.get_owned_classroom(&req).await
}

pub async fn get_classroom(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.get_classroom(&req).await
}

pub async fn update_classroom(
    req: HttpRequest,
    body: web::Json<UpdateClassroomRequest>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .update_classroom(&req, body.into_inner())
        .await
}

pub async fn archive_classroom(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.archive_classroom(&req).await
}

pub async fn delete_classroom(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.delete_classroom(&req).await
}

pub async fn redirect_to_gitlab(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.redirect_to_gitlab(&req).await
}

pub async fn list_runners(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.list_runners(&req).await
}

pub async fn classroom_report(
    req: HttpRequest,
    query: web::Query<ReportQuery>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .classroom_report(&req, query.into_inner())
        .await
}

fn viewable() -> RequireClassroomPolicy {
    RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable])
}

fn owner_active() -> RequireClassroomPolicy {
    RequireClassroomPolicy::new(&[
        ClassroomPolicy::Viewable,
        ClassroomPolicy::Owner,
        ClassroomPolicy::NotArchived,
    ])
}

// 配置路由
pub fn configure_classroom_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classrooms")
            .wrap(middlewares::RequireSession)
            .service(
                // 当前用户加入的课堂；任何登录用户都可以创建课堂
                web::resource("")
                    .route(web::get().to(list_classrooms))
                    .route(web::post().to(create_classroom)),
            )
            // 必须在 /{classroom_id} 之前注册
            .service(web::resource("/owned").route(web::get().to(list_owned_classrooms)))
            .service(
                web::resource("/owned/{classroom_id}")
                    .wrap(RequireClassroomPolicy::owner())
                    .wrap(middlewares::RotateGroupToken)
                    .wrap(middlewares::ResolveClassroom)
                    .route(web::get().to(get_owned_classroom)),
            )
            .service(
                web::scope("/{classroom_id}")
                    // 所有者访问时按需轮换组访问令牌
                    .wrap(middlewares::RotateGroupToken)
                    .wrap(middlewares::ResolveClassroom)
                    .service(
                        web::resource("")
                            .route(web::get().to(get_classroom).wrap(viewable()))
                            .route(web::put().to(update_classroom).wrap(owner_active()))
                            .route(
                                web::delete()
                                    .to(delete_classroom)
                                    .wrap(RequireClassroomPolicy::owner()),
                            ),
                    )
                    .route(
                        "/archive",
                        web::post()
                            .to(archive_classroom)
                            .wrap(RequireClassroomPolicy::owner()),
                    )
                    .route(
                        "/gitlab",
                        web::get().to(redirect_to_gitlab).wrap(viewable()),
                    )
                    .route(
                        "/runners",
                        web::get()
                            .to(list_runners)
                            .wrap(RequireClassroomPolicy::manager()),
                    )
                    .route(
                        "/report",
                        web::get()
                            .to(classroom_report)
                            .wrap(RequireClassroomPolicy::manager()),
                    )
                    .configure(members::configure_member_routes)
                    .configure(invitations::configure_classroom_invitation_routes)
                    .configure(teams::configure_team_routes)
                    .configure(assignments::configure_assignment_routes)
                    .configure(projects::configure_project_routes)
                    .configure(rubrics::configure_rubric_routes),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::gitlab::OAuthToken;
    use crate::services::session::SessionStore;
    use crate::services::test_support::{Fixture, OWNER_ID};
    use crate::services::token_rotation::TokenRotator;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn owned_classroom_view_rotates_stale_group_token() {
        let fx = Fixture::new().await;
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        let sessions = Arc::new(SessionStore::new(cache, "sid", 60, false));
        let mut session = sessions.create().await;
        session.user_id = Some(OWNER_ID);
        session.gitlab_token = Some(OAuthToken {
            access_token: "oauth".into(),
            refresh_token: "refresh".into(),
            expires_in: 0,
            created_at: 0,
        });
        sessions.save(&session).await;
        // 任何令牌都视为过期
        let rotator = Arc::new(TokenRotator::new(
            fx.storage.clone(),
            fx.provider.clone(),
            -1,
            30,
        ));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.provider.clone()))
                .app_data(web::Data::new(sessions.clone()))
                .app_data(web::Data::new(rotator))
                .configure(configure_classroom_routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/classrooms/owned/{}", fx.classroom.id))
                .cookie(Cookie::new("sid", session.id.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.fake.count("rotate_group_access_token"), 1);
        assert_ne!(
            fx.reload_classroom().await.group_access_token_id,
            fx.classroom.group_access_token_id
        );
    }
}
