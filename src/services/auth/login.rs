use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::AuthService;
use crate::utils::random_token;

const STATE_BYTES: usize = 16;

/// 在会话中记下随机 state 后跳转到 GitLab 授权页；没有会话时新建一个
pub async fn handle_login(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let sessions = service.get_sessions(request);
    let oauth = service.get_oauth(request);

    let mut session = match sessions.load_from_request(request).await {
        Some(session) => session,
        None => sessions.create().await,
    };
    let state = random_token(STATE_BYTES);
    session.oauth_state = Some(state.clone());
    sessions.save(&session).await;
    debug!("Starting GitLab OAuth flow");

    Ok(HttpResponse::Found()
        .cookie(sessions.cookie(&session))
        .insert_header(("Location", oauth.authorize_url(&state)))
        .finish())
}
