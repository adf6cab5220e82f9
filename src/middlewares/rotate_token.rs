/*!
 * 组访问令牌轮换中间件
 *
 * 必须在 ResolveClassroom 之后使用。课堂所有者访问时，如果组访问令牌已超过轮换年龄，
 * 通过共享的 `TokenRotator` 轮换令牌并替换请求中的课堂上下文。
 * 轮换失败只记录日志，请求照常继续。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};

use super::{ClassroomContext, shared_state};
use crate::gitlab::GitLabProvider;
use crate::models::user_classrooms::policies::is_owner;
use crate::services::token_rotation::TokenRotator;

#[derive(Clone)]
pub struct RotateGroupToken;

async fn refresh_context(req: &ServiceRequest) {
    let Some(context) = req.extensions().get::<ClassroomContext>().cloned() else {
        return;
    };
    let (Some(rotator), Some(provider)) = (
        shared_state::<Arc<TokenRotator>>(req),
        shared_state::<Arc<dyn GitLabProvider>>(req),
    ) else {
        return;
    };
    if !is_owner(&context.membership) || !rotator.needs_rotation(&context.classroom, chrono::Utc::now())
    {
        return;
    }

    let previous_token_id = context.classroom.group_access_token_id;
    let classroom = rotator.ensure_fresh_or_keep(context.classroom).await;
    if classroom.group_access_token_id != previous_token_id {
        let gitlab = provider.for_classroom(&classroom);
        req.extensions_mut().insert(ClassroomContext {
            classroom,
            membership: context.membership,
            gitlab,
        });
    }
}

impl<S, B> Transform<S, ServiceRequest> for RotateGroupToken
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RotateGroupTokenMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RotateGroupTokenMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RotateGroupTokenMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RotateGroupTokenMiddleware<S>
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
            refresh_context(&req).await;
            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}
