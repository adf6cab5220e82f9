/*!
 * 课堂访问策略中间件
 *
 * 必须在 ResolveClassroom（以及需要项目的策略所用的 ResolveResource）之后使用。
 * 按给定顺序检查策略，全部满足才放行；第一个不满足的策略决定 403 的错误码和消息。
 *
 * ```rust,ignore
 * web::put()
 *     .to(update_classroom)
 *     .wrap(RequireClassroomPolicy::new(&[ClassroomPolicy::Owner, ClassroomPolicy::NotArchived]))
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
use std::rc::Rc;
use tracing::debug;

use super::{ClassroomContext, create_error_response};
use crate::models::{
    ErrorCode,
    projects::entities::AssignmentProject,
    user_classrooms::policies::{ClassroomPolicy, PolicyInput, first_denied},
};

#[derive(Clone)]
pub struct RequireClassroomPolicy {
    policies: Rc<[ClassroomPolicy]>,
}

impl RequireClassroomPolicy {
    pub fn new(policies: &[ClassroomPolicy]) -> Self {
        Self {
            policies: policies.into(),
        }
    }

    pub fn owner() -> Self {
        Self::new(&[ClassroomPolicy::Viewable, ClassroomPolicy::Owner])
    }

    pub fn manager() -> Self {
        Self::new(&[ClassroomPolicy::Viewable, ClassroomPolicy::OwnerOrModerator])
    }
}

// 辅助函数：检查策略，返回第一个不满足的策略
fn check(req: &ServiceRequest, policies: &[ClassroomPolicy]) -> Result<(), (StatusCode, ErrorCode, String)> {
    let extensions = req.extensions();
    let Some(context) = extensions.get::<ClassroomContext>() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "classroom context missing".to_string(),
        ));
    };
    let project_team_id = extensions.get::<AssignmentProject>().map(|p| p.team_id);

    let input = PolicyInput {
        classroom: &context.classroom,
        membership: &context.membership,
        project_team_id,
    };
    match first_denied(policies, &input) {
        None => Ok(()),
        Some(policy) => {
            debug!(
                "User {} denied by policy {:?} in classroom {}",
                context.membership.user_id, policy, context.classroom.id
            );
            let (code, message) = policy.denial();
            Err((StatusCode::FORBIDDEN, code, message.to_string()))
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireClassroomPolicy
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireClassroomPolicyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireClassroomPolicyMiddleware {
            service: Rc::new(service),
            policies: self.policies.clone(),
        }))
    }
}

pub struct RequireClassroomPolicyMiddleware<S> {
    service: Rc<S>,
    policies: Rc<[ClassroomPolicy]>,
}

impl<S, B> Service<ServiceRequest> for RequireClassroomPolicyMiddleware<S>
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
        let policies = self.policies.clone();
        Box::pin(async move {
            match check(&req, &policies) {
                Ok(()) => Ok(srv.call(req).await?.map_into_left_body()),
                Err((status, code, message)) => Ok(req.into_response(
                    create_error_response(status, code, &message).map_into_right_body(),
                )),
            }
        })
    }
}
