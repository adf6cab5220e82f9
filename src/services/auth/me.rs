use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AuthService;
use crate::middlewares::RequireSession;
use crate::models::{ApiResponse, ErrorCode, auth::responses::MeResponse};
use crate::services::current_user;

pub async fn handle_me(_service: &AuthService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let Some(session) = RequireSession::extract_session(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing session",
        )));
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MeResponse {
            user,
            csrf_token: session.csrf_token,
        },
        "Current user retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{auth_request, sessions};
    use crate::services::test_support::{Fixture, OWNER_ID, body_json};
    use actix_web::HttpMessage;

    #[actix_web::test]
    async fn returns_user_and_csrf_token() {
        let fx = Fixture::new().await;
        let store = sessions();
        let session = store.create().await;

        let req = auth_request(&fx, &store).to_http_request();
        req.extensions_mut().insert(fx.owner.clone());
        req.extensions_mut().insert(session.clone());
        let body = body_json(handle_me(&AuthService::new_lazy(), &req).await.unwrap()).await;
        assert_eq!(body["data"]["user"]["id"], OWNER_ID);
        assert_eq!(body["data"]["csrf_token"], session.csrf_token);
    }
}
