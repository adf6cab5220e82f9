/*!
 * 课堂内资源解析中间件
 *
 * 必须在 ResolveClassroom 之后使用。按资源种类读取路径参数，在当前课堂范围内
 * 加载资源并放进请求扩展；路径参数格式错误返回 400，资源不存在返回 404。
 *
 * ```rust,ignore
 * web::scope("/assignments/{assignment_id}")
 *     .wrap(ResolveResource::new(ResourceKind::Assignment))
 * ```
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
use uuid::Uuid;

use super::{ClassroomContext, create_error_response, shared_state};
use crate::models::ErrorCode;
use crate::storage::Storage;
use crate::utils::parse_uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Assignment,
    Team,
    Member,
    Project,
    Rubric,
    Invitation,
}

impl ResourceKind {
    pub fn param(self) -> &'static str {
        match self {
            ResourceKind::Assignment => "assignment_id",
            ResourceKind::Team => "team_id",
            ResourceKind::Member => "member_id",
            ResourceKind::Project => "project_id",
            ResourceKind::Rubric => "rubric_id",
            ResourceKind::Invitation => "invitation_id",
        }
    }

    fn not_found(self) -> (ErrorCode, &'static str) {
        match self {
            ResourceKind::Assignment => (ErrorCode::AssignmentNotFound, "assignment not found"),
            ResourceKind::Team => (ErrorCode::TeamNotFound, "team not found"),
            ResourceKind::Member => (ErrorCode::MemberNotFound, "member not found"),
            ResourceKind::Project => (ErrorCode::ProjectNotFound, "project not found"),
            ResourceKind::Rubric => (ErrorCode::RubricNotFound, "rubric not found"),
            ResourceKind::Invitation => (ErrorCode::InvitationNotFound, "invitation not found"),
        }
    }
}

#[derive(Clone)]
pub struct ResolveResource {
    kind: ResourceKind,
}

impl ResolveResource {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

type Rejection = (StatusCode, ErrorCode, String);

fn bad_param(kind: ResourceKind) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        ErrorCode::BadRequest,
        format!("Missing or invalid {}", kind.param()),
    )
}

fn missing(kind: ResourceKind) -> Rejection {
    let (code, message) = kind.not_found();
    (StatusCode::NOT_FOUND, code, message.to_string())
}

fn db_failure(e: impl std::fmt::Display) -> Rejection {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalServerError,
        format!("Failed to load resource: {e}"),
    )
}

fn uuid_param(req: &ServiceRequest, kind: ResourceKind) -> Result<Uuid, Rejection> {
    req.match_info()
        .get(kind.param())
        .and_then(parse_uuid)
        .ok_or_else(|| bad_param(kind))
}

async fn resolve(req: &ServiceRequest, kind: ResourceKind) -> Result<(), Rejection> {
    let classroom_id = req
        .extensions()
        .get::<ClassroomContext>()
        .map(|ctx| ctx.classroom.id)
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "classroom context missing".to_string(),
            )
        })?;
    let storage = shared_state::<Arc<dyn Storage>>(req).ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "Storage not found in app data".to_string(),
        )
    })?;

    match kind {
        ResourceKind::Assignment => {
            let id = uuid_param(req, kind)?;
            let assignment = storage
                .get_assignment(classroom_id, id)
                .await
                .map_err(db_failure)?
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(assignment);
        }
        ResourceKind::Team => {
            let id = uuid_param(req, kind)?;
            let team = storage
                .get_team(classroom_id, id)
                .await
                .map_err(db_failure)?
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(team);
        }
        ResourceKind::Member => {
            // 成员以 GitLab 用户 ID 标识
            let user_id = req
                .match_info()
                .get(kind.param())
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| bad_param(kind))?;
            let member = storage
                .get_member(classroom_id, user_id)
                .await
                .map_err(db_failure)?
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(member);
        }
        ResourceKind::Project => {
            let id = uuid_param(req, kind)?;
            let project = storage
                .get_assignment_project(classroom_id, id)
                .await
                .map_err(db_failure)?
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(project);
        }
        ResourceKind::Rubric => {
            let id = uuid_param(req, kind)?;
            let rubric = storage
                .get_rubric(classroom_id, id)
                .await
                .map_err(db_failure)?
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(rubric);
        }
        ResourceKind::Invitation => {
            let id = uuid_param(req, kind)?;
            let invitation = storage
                .get_invitation(id)
                .await
                .map_err(db_failure)?
                .filter(|inv| inv.classroom_id == classroom_id)
                .ok_or_else(|| missing(kind))?;
            req.extensions_mut().insert(invitation);
        }
    }
    Ok(())
}

impl<S, B> Transform<S, ServiceRequest> for ResolveResource
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ResolveResourceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResolveResourceMiddleware {
            service: Rc::new(service),
            kind: self.kind,
        }))
    }
}

pub struct ResolveResourceMiddleware<S> {
    service: Rc<S>,
    kind: ResourceKind,
}

impl<S, B> Service<ServiceRequest> for ResolveResourceMiddleware<S>
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
        let kind = self.kind;
        Box::pin(async move {
            match resolve(&req, kind).await {
                Ok(()) => Ok(srv.call(req).await?.map_into_left_body()),
                Err((status, code, message)) => Ok(req.into_response(
                    create_error_response(status, code, &message).map_into_right_body(),
                )),
            }
        })
    }
}
