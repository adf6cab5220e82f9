pub mod require_policy;
pub mod require_session;
pub mod resolve_classroom;
pub mod resolve_resource;
pub mod rotate_token;

pub use require_policy::RequireClassroomPolicy;
pub use require_session::{RequireSession, UserGitLab};
pub use resolve_classroom::{ClassroomContext, ResolveClassroom};
pub use resolve_resource::{ResolveResource, ResourceKind};
pub use rotate_token::RotateGroupToken;

use actix_web::{
    HttpResponse,
    dev::ServiceRequest,
    http::{StatusCode, header::CONTENT_TYPE},
    web,
};

use crate::models::{ApiResponse, ErrorCode};

// 辅助函数：创建错误响应
pub(crate) fn create_error_response(
    status: StatusCode,
    code: ErrorCode,
    message: &str,
) -> HttpResponse {
    match status {
        StatusCode::NO_CONTENT => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .finish(),
        _ => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .json(ApiResponse::<()>::error_empty(code, message)),
    }
}

// 辅助函数：读取 app_data 中共享的状态
pub(crate) fn shared_state<T: Clone + 'static>(req: &ServiceRequest) -> Option<T> {
    req.app_data::<web::Data<T>>().map(|data| data.get_ref().clone())
}
