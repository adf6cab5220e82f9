use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::CallbackQuery;
use crate::services::AuthService;

// 懒加载的全局 AUTH_SERVICE 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(&req).await
}

pub async fn callback(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.callback(&req, query.into_inner()).await
}

pub async fn logout(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&req).await
}

pub async fn me(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.me(&req).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .route("/login", web::get().to(login))
            .route("/callback", web::get().to(callback))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireSession)
                    .route("/logout", web::post().to(logout))
                    .route("/me", web::get().to(me)),
            ),
    );
}
