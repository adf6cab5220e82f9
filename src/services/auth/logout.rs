use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AuthService;
use crate::middlewares::RequireSession;
use crate::models::ApiResponse;

/// 删除服务端会话并清空 cookie
pub async fn handle_logout(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let sessions = service.get_sessions(request);
    if let Some(session) = RequireSession::extract_session(request) {
        sessions.destroy(&session.id).await;
        info!("User {:?} logged out", session.user_id);
    }

    Ok(HttpResponse::Ok()
        .cookie(sessions.removal_cookie())
        .json(ApiResponse::<()>::success_empty("Logged out")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{auth_request, sessions};
    use crate::services::test_support::Fixture;
    use actix_web::HttpMessage;

    #[actix_web::test]
    async fn logout_destroys_session() {
        let fx = Fixture::new().await;
        let store = sessions();
        let mut session = store.create().await;
        session.user_id = Some(1);
        store.save(&session).await;

        let req = auth_request(&fx, &store).to_http_request();
        req.extensions_mut().insert(session.clone());
        let resp = handle_logout(&AuthService::new_lazy(), &req).await.unwrap();

        let cookie = resp.cookies().find(|c| c.name() == "sid").unwrap();
        assert_eq!(cookie.value(), "");
        assert!(store.load(&session.id).await.is_none());
    }
}
