/*!
 * 会话认证中间件
 *
 * 从 cookie 中的会话 ID 加载服务端会话，必要时刷新 GitLab OAuth 令牌，
 * 然后把 `User`、`Session` 和以用户身份访问 GitLab 的客户端放进请求扩展。
 *
 * ```rust,ignore
 * web::scope("/api/v1/classrooms")
 *     .wrap(RequireSession)
 *     .route("", web::get().to(list_classrooms))
 * ```
 *
 * 修改类请求（POST/PUT/PATCH/DELETE）必须在 `X-Csrf-Token` 头中带上会话的 CSRF 令牌。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info, warn};

use super::{create_error_response, shared_state};
use crate::gitlab::{GitLabApi, GitLabOAuth, GitLabProvider};
use crate::models::{ErrorCode, auth::session::Session, users::entities::User};
use crate::services::session::SessionStore;
use crate::storage::Storage;

pub const CSRF_HEADER: &str = "X-Csrf-Token";

/// 以登录用户身份访问 GitLab 的客户端
#[derive(Clone)]
pub struct UserGitLab(pub Arc<dyn GitLabApi>);

#[derive(Clone)]
pub struct RequireSession;

struct Rejection {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl Rejection {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: ErrorCode::Unauthorized,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: ErrorCode::InternalServerError,
            message: message.into(),
        }
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

// 辅助函数：加载会话和用户
async fn authenticate(req: &ServiceRequest) -> Result<(User, Session, UserGitLab), Rejection> {
    let sessions = shared_state::<Arc<SessionStore>>(req)
        .ok_or_else(|| Rejection::internal("Session store not found in app data"))?;
    let storage = shared_state::<Arc<dyn Storage>>(req)
        .ok_or_else(|| Rejection::internal("Storage not found in app data"))?;
    let provider = shared_state::<Arc<dyn GitLabProvider>>(req)
        .ok_or_else(|| Rejection::internal("GitLab provider not found in app data"))?;

    let session_id = req
        .cookie(sessions.cookie_name())
        .map(|c| c.value().to_string())
        .ok_or_else(|| Rejection::unauthorized("Unauthorized: not logged in"))?;
    let mut session = sessions
        .load(&session_id)
        .await
        .ok_or_else(|| Rejection::unauthorized("Unauthorized: session expired"))?;

    let (Some(user_id), Some(token)) = (session.user_id, session.gitlab_token.clone()) else {
        return Err(Rejection::unauthorized("Unauthorized: not logged in"));
    };

    // OAuth 令牌过期时用 refresh token 换新
    let token = if token.is_expired(chrono::Utc::now().timestamp()) {
        let oauth = shared_state::<Arc<GitLabOAuth>>(req)
            .ok_or_else(|| Rejection::internal("GitLab OAuth client not found in app data"))?;
        match oauth.refresh(&token.refresh_token).await {
            Ok(fresh) => {
                debug!("Refreshed GitLab token for user {}", user_id);
                session.gitlab_token = Some(fresh.clone());
                sessions.save(&session).await;
                fresh
            }
            Err(e) => {
                warn!("Failed to refresh GitLab token for user {}: {}", user_id, e);
                sessions.destroy(&session.id).await;
                return Err(Rejection::unauthorized(
                    "Unauthorized: GitLab authorization expired",
                ));
            }
        }
    } else {
        token
    };

    if is_mutating(req.method()) {
        let provided = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        if provided.is_empty() || provided != session.csrf_token {
            return Err(Rejection {
                status: StatusCode::FORBIDDEN,
                code: ErrorCode::CsrfTokenInvalid,
                message: "CSRF token missing or invalid".to_string(),
            });
        }
    }

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| Rejection::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| Rejection::unauthorized("Unauthorized: user not found"))?;

    let gitlab = UserGitLab(provider.for_user(&token.secret()));
    Ok((user, session, gitlab))
}

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
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
            // 处理 OPTIONS 请求
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match authenticate(&req).await {
                Ok((user, session, gitlab)) => {
                    debug!("Session authentication successful for user {}", user.id);
                    req.extensions_mut().insert(user);
                    req.extensions_mut().insert(session);
                    req.extensions_mut().insert(gitlab);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(rejection) => {
                    info!(
                        "Session authentication failed for request to {}: {}",
                        req.path(),
                        rejection.message
                    );
                    Ok(req.into_response(
                        create_error_response(
                            rejection.status,
                            rejection.code,
                            &rejection.message,
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取会话信息
impl RequireSession {
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_session(req: &actix_web::HttpRequest) -> Option<Session> {
        req.extensions().get::<Session>().cloned()
    }

    pub fn extract_gitlab(req: &actix_web::HttpRequest) -> Option<Arc<dyn GitLabApi>> {
        req.extensions().get::<UserGitLab>().map(|g| g.0.clone())
    }
}
