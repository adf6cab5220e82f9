use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::{error, info, warn};

use super::AuthService;
use crate::models::{
    ApiResponse, ErrorCode, auth::requests::CallbackQuery, users::requests::UpsertUserRequest,
};
use crate::services::{get_provider, internal_error};

fn auth_failed(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    ApiResponse::error_response(status, code, message)
}

/// 校验 state，换取令牌，同步用户资料，然后换发一个已登录的新会话
pub async fn handle_callback(
    service: &AuthService,
    request: &HttpRequest,
    query: CallbackQuery,
) -> ActixResult<HttpResponse> {
    if let Some(reason) = query.error.as_deref() {
        warn!("GitLab authorization denied: {}", reason);
        return Ok(auth_failed(
            StatusCode::BAD_REQUEST,
            ErrorCode::AuthFailed,
            "GitLab authorization was denied",
        ));
    }
    let sessions = service.get_sessions(request);

    let Some(session) = sessions.load_from_request(request).await else {
        return Ok(auth_failed(
            StatusCode::BAD_REQUEST,
            ErrorCode::OAuthStateMismatch,
            "login session not found",
        ));
    };
    let expected = session.oauth_state.as_deref().unwrap_or_default();
    let provided = query.state.as_deref().unwrap_or_default();
    if expected.is_empty() || expected != provided {
        return Ok(auth_failed(
            StatusCode::BAD_REQUEST,
            ErrorCode::OAuthStateMismatch,
            "OAuth state mismatch",
        ));
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Ok(auth_failed(
            StatusCode::BAD_REQUEST,
            ErrorCode::AuthFailed,
            "authorization code missing",
        ));
    };

    let token = match service.get_oauth(request).exchange_code(code).await {
        Ok(token) => token,
        Err(e) => {
            error!("GitLab token exchange failed: {}", e);
            return Ok(internal_error(
                ErrorCode::AuthFailed,
                format!("GitLab token exchange failed: {e}"),
            ));
        }
    };
    let gitlab_user = match get_provider(request)
        .for_user(&token.secret())
        .get_current_user()
        .await
    {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to load GitLab profile: {}", e);
            return Ok(internal_error(
                ErrorCode::AuthFailed,
                format!("Failed to load GitLab profile: {e}"),
            ));
        }
    };
    let user = match service
        .get_storage(request)
        .upsert_user(UpsertUserRequest::from(&gitlab_user))
        .await
    {
        Ok(user) => user,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Failed to store user: {e}"),
            ));
        }
    };

    // 登录后换新会话 ID
    sessions.destroy(&session.id).await;
    let mut fresh = sessions.create().await;
    fresh.user_id = Some(user.id);
    fresh.gitlab_token = Some(token);
    sessions.save(&fresh).await;

    info!("User {} ({}) logged in", user.id, user.username);
    Ok(HttpResponse::Found()
        .cookie(sessions.cookie(&fresh))
        .insert_header(("Location", service.get_config().app.public_url.clone()))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{auth_request, sessions};
    use crate::services::test_support::{Fixture, body_json};
    use actix_web::cookie::Cookie;

    fn query(state: Option<&str>) -> CallbackQuery {
        CallbackQuery {
            code: Some("code".into()),
            state: state.map(str::to_string),
            error: None,
        }
    }

    #[actix_web::test]
    async fn state_mismatch_is_rejected_before_exchange() {
        let fx = Fixture::new().await;
        let store = sessions();
        let mut session = store.create().await;
        session.oauth_state = Some("expected".into());
        store.save(&session).await;

        let req = auth_request(&fx, &store)
            .cookie(Cookie::new("sid", session.id.clone()))
            .to_http_request();
        let resp = handle_callback(&AuthService::new_lazy(), &req, query(Some("forged")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["code"],
            ErrorCode::OAuthStateMismatch as i32
        );
        assert_eq!(fx.fake.count("get_current_user"), 0);
    }

    #[actix_web::test]
    async fn callback_without_session_is_rejected() {
        let fx = Fixture::new().await;
        let store = sessions();
        let req = auth_request(&fx, &store).to_http_request();
        let resp = handle_callback(&AuthService::new_lazy(), &req, query(Some("x")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn denied_authorization_is_reported() {
        let fx = Fixture::new().await;
        let store = sessions();
        let req = auth_request(&fx, &store).to_http_request();
        let resp = handle_callback(
            &AuthService::new_lazy(),
            &req,
            CallbackQuery {
                code: None,
                state: None,
                error: Some("access_denied".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(body_json(resp).await["code"], ErrorCode::AuthFailed as i32);
    }
}
