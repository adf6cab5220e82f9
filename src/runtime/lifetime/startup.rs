use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{ObjectCache, register::get_object_cache_plugin, register::registered_object_cache_plugins};
use crate::config::AppConfig;
use crate::gitlab::{GitLabOAuth, GitLabProvider, RestGitLabProvider};
use crate::services::mail::{Mailer, OutboxMailer};
use crate::services::session::SessionStore;
use crate::services::token_rotation::TokenRotator;
use crate::storage::Storage;

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub provider: Arc<dyn GitLabProvider>,
    pub oauth: Arc<GitLabOAuth>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: Arc<SessionStore>,
    pub rotator: Arc<TokenRotator>,
}

async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to Moka (in-memory) cache");
        if let Some(cache) = build_cache("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、GitLab 客户端和会话
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::get();

    if cfg!(debug_assertions) {
        debug!(
            "Registered cache backends: {:?}",
            registered_object_cache_plugins()
        );
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    let provider: Arc<dyn GitLabProvider> = Arc::new(
        RestGitLabProvider::from_config(config).expect("Failed to create GitLab client"),
    );
    let oauth = Arc::new(GitLabOAuth::from_config(config).expect("Failed to create OAuth client"));
    warn!("Using GitLab instance at {}", config.gitlab.url);

    let mailer: Arc<dyn Mailer> = Arc::new(OutboxMailer::from_config(config));
    let sessions = Arc::new(SessionStore::from_config(cache.clone(), config));
    let rotator = Arc::new(TokenRotator::from_config(
        storage.clone(),
        provider.clone(),
        config,
    ));

    StartupContext {
        storage,
        cache,
        provider,
        oauth,
        mailer,
        sessions,
        rotator,
    }
}
