/*!
 * 课堂上下文解析中间件
 *
 * 必须在 RequireSession 之后使用。解析路径中的 `classroom_id`，加载课堂和
 * 调用者的成员关系，并以 [`ClassroomContext`] 放进请求扩展。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::debug;

use super::{create_error_response, shared_state};
use crate::gitlab::{GitLabApi, GitLabProvider};
use crate::models::{
    ErrorCode, classrooms::entities::Classroom, user_classrooms::entities::UserClassroom,
    users::entities::User,
};
use crate::storage::Storage;
use crate::utils::parse_uuid;

/// 当前请求的课堂、调用者的成员关系，以及以课堂组令牌访问 GitLab 的客户端
#[derive(Clone)]
pub struct ClassroomContext {
    pub classroom: Classroom,
    pub membership: UserClassroom,
    pub gitlab: Arc<dyn GitLabApi>,
}

impl ClassroomContext {
    pub fn extract(req: &actix_web::HttpRequest) -> Option<ClassroomContext> {
        req.extensions().get::<ClassroomContext>().cloned()
    }
}

#[derive(Clone)]
pub struct ResolveClassroom;

async fn resolve(req: &ServiceRequest) -> Result<ClassroomContext, (StatusCode, ErrorCode, String)> {
    let user_id = req
        .extensions()
        .get::<User>()
        .map(|u| u.id)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Unauthorized: missing user".to_string(),
            )
        })?;

    let classroom_id = req
        .match_info()
        .get("classroom_id")
        .and_then(parse_uuid)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Missing or invalid classroom_id".to_string(),
            )
        })?;

    let internal = |msg: String| (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalServerError, msg);
    let storage = shared_state::<Arc<dyn Storage>>(req)
        .ok_or_else(|| internal("Storage not found in app data".to_string()))?;
    let provider = shared_state::<Arc<dyn GitLabProvider>>(req)
        .ok_or_else(|| internal("GitLab provider not found in app data".to_string()))?;

    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            ErrorCode::ClassroomNotFound,
            "classroom not found".to_string(),
        )
    };

    // 非成员与不存在的课堂返回同样的 404
    let membership = storage
        .get_membership(classroom_id, user_id)
        .await
        .map_err(|e| internal(format!("Failed to load membership: {e}")))?
        .ok_or_else(not_found)?;
    let classroom = storage
        .get_classroom_by_id(classroom_id)
        .await
        .map_err(|e| internal(format!("Failed to load classroom: {e}")))?
        .ok_or_else(not_found)?;

    let gitlab = provider.for_classroom(&classroom);
    Ok(ClassroomContext {
        classroom,
        membership,
        gitlab,
    })
}

impl<S, B> Transform<S, ServiceRequest> for ResolveClassroom
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ResolveClassroomMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResolveClassroomMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ResolveClassroomMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ResolveClassroomMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            match resolve(&req).await {
                Ok(context) => {
                    debug!(
                        "User {} resolved classroom {} as {}",
                        context.membership.user_id, context.classroom.id, context.membership.role
                    );
                    req.extensions_mut().insert(context);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err((status, code, message)) => Ok(req.into_response(
                    create_error_response(status, code, &message).map_into_right_body(),
                )),
            }
        })
    }
}
