//! 服务端会话
//!
//! 会话以 JSON 保存在对象缓存的 `session:{id}` 下，cookie 只携带随机会话 ID。

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite};
use std::sync::Arc;

use crate::cache::{CacheResult, ObjectCache, ObjectCacheExt};
use crate::config::AppConfig;
use crate::models::auth::session::Session;
use crate::utils::random_token;

const SESSION_ID_BYTES: usize = 32;
const CSRF_TOKEN_BYTES: usize = 32;

pub struct SessionStore {
    cache: Arc<dyn ObjectCache>,
    cookie_name: String,
    ttl: u64,
    secure: bool,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn ObjectCache>, cookie_name: &str, ttl: u64, secure: bool) -> Self {
        Self {
            cache,
            cookie_name: cookie_name.to_string(),
            ttl,
            secure,
        }
    }

    pub fn from_config(cache: Arc<dyn ObjectCache>, config: &AppConfig) -> Self {
        Self::new(
            cache,
            &config.session.cookie_name,
            config.session.ttl,
            config.session.secure,
        )
    }

    fn key(id: &str) -> String {
        format!("session:{id}")
    }

    /// 新建匿名会话并保存
    pub async fn create(&self) -> Session {
        let session = Session {
            id: random_token(SESSION_ID_BYTES),
            csrf_token: random_token(CSRF_TOKEN_BYTES),
            oauth_state: None,
            user_id: None,
            gitlab_token: None,
            created_at: chrono::Utc::now().timestamp(),
        };
        self.save(&session).await;
        session
    }

    pub async fn load(&self, id: &str) -> Option<Session> {
        match self.cache.get_json::<Session>(&Self::key(id)).await {
            CacheResult::Found(session) => Some(session),
            _ => None,
        }
    }

    /// 按请求 cookie 加载会话
    pub async fn load_from_request(&self, req: &HttpRequest) -> Option<Session> {
        let id = req.cookie(&self.cookie_name)?.value().to_string();
        self.load(&id).await
    }

    pub async fn save(&self, session: &Session) {
        self.cache
            .insert_json(Self::key(&session.id), session, self.ttl)
            .await;
    }

    pub async fn destroy(&self, id: &str) {
        self.cache.remove(&Self::key(id)).await;
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), session.id.clone())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(self.ttl as i64))
            // 从 GitLab 重定向回来时需要带上 cookie
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure)
            .finish()
    }

    /// 注销时清空 cookie
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure)
            .finish()
    }
}
