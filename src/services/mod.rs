pub mod access_levels;
pub mod assignments;
pub mod auth;
pub mod classrooms;
pub mod invitations;
pub mod mail;
pub mod members;
pub mod projects;
pub mod rubrics;
pub mod session;
pub mod teams;
pub mod token_rotation;

#[cfg(test)]
pub(crate) mod test_support;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use classrooms::ClassroomService;
pub use invitations::InvitationService;
pub use members::MemberService;
pub use projects::ProjectService;
pub use rubrics::RubricService;
pub use teams::TeamService;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, http::StatusCode, web};
use std::sync::Arc;

use crate::gitlab::{GitLabApi, GitLabError, GitLabProvider};
use crate::middlewares::{ClassroomContext, RequireSession};
use crate::models::{ApiResponse, ErrorCode, users::entities::User};
use crate::services::mail::Mailer;

// 读取 app_data 中共享的状态
pub(crate) fn app_state<T: Clone + 'static>(request: &HttpRequest) -> Option<T> {
    request
        .app_data::<web::Data<T>>()
        .map(|data| data.get_ref().clone())
}

pub(crate) fn get_provider(request: &HttpRequest) -> Arc<dyn GitLabProvider> {
    app_state::<Arc<dyn GitLabProvider>>(request).expect("GitLab provider not found in app data")
}

pub(crate) fn get_mailer(request: &HttpRequest) -> Arc<dyn Mailer> {
    app_state::<Arc<dyn Mailer>>(request).expect("Mailer not found in app data")
}

/// 中间件放进请求扩展的值；缺失说明路由没有挂对应的中间件
pub(crate) fn require_extension<T: Clone + 'static>(
    request: &HttpRequest,
    what: &str,
) -> Result<T, HttpResponse> {
    request.extensions().get::<T>().cloned().ok_or_else(|| {
        ApiResponse::error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            format!("{what} missing from request"),
        )
    })
}

pub(crate) fn classroom_context(request: &HttpRequest) -> Result<ClassroomContext, HttpResponse> {
    require_extension::<ClassroomContext>(request, "classroom context")
}

pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireSession::extract_user(request).ok_or_else(|| {
        ApiResponse::error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )
    })
}

/// 以登录用户的 OAuth 令牌访问 GitLab 的客户端
pub(crate) fn user_gitlab(request: &HttpRequest) -> Result<Arc<dyn GitLabApi>, HttpResponse> {
    RequireSession::extract_gitlab(request).ok_or_else(|| {
        ApiResponse::error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized: missing GitLab session",
        )
    })
}

pub(crate) fn internal_error(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    ApiResponse::error_response(StatusCode::INTERNAL_SERVER_ERROR, code, message)
}

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    ApiResponse::error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
}

/// GitLab 错误统一按 500 返回，消息带上原始错误
pub(crate) fn gitlab_error(context: &str, err: &GitLabError) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    internal_error(ErrorCode::GitLabError, format!("{context}: {err}"))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header(("Location", location))
        .finish()
}
