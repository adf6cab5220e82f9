pub mod callback;
pub mod login;
pub mod logout;
pub mod me;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gitlab::GitLabOAuth;
use crate::models::auth::requests::CallbackQuery;
use crate::services::app_state;
use crate::services::session::SessionStore;
use crate::storage::Storage;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_sessions(&self, request: &HttpRequest) -> Arc<SessionStore> {
        app_state::<Arc<SessionStore>>(request).expect("Session store not found in app data")
    }

    pub(crate) fn get_oauth(&self, request: &HttpRequest) -> Arc<GitLabOAuth> {
        app_state::<Arc<GitLabOAuth>>(request).expect("GitLab OAuth client not found in app data")
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 跳转到 GitLab 授权页
    pub async fn login(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        login::handle_login(self, request).await
    }

    // GitLab 授权回调
    pub async fn callback(
        &self,
        request: &HttpRequest,
        query: CallbackQuery,
    ) -> ActixResult<HttpResponse> {
        callback::handle_callback(self, request, query).await
    }

    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        logout::handle_logout(self, request).await
    }

    // 当前用户和 CSRF 令牌
    pub async fn me(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        me::handle_me(self, request).await
    }
}
