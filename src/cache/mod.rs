//! 对象缓存
//!
//! 以字符串为值的键值缓存，目前用于保存服务端会话。
//! 后端以插件形式注册（见 [`register`]），启动时按配置选择。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端出错或值无法解析
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// `ttl` 为 0 时使用后端默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// JSON 序列化的便捷方法
#[async_trait]
pub trait ObjectCacheExt: ObjectCache {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> CacheResult<T> {
        let json = match self.get_raw(key).await {
            CacheResult::Found(json) => json,
            CacheResult::NotFound => return CacheResult::NotFound,
            CacheResult::ExistsButNoValue => return CacheResult::ExistsButNoValue,
        };
        let error = match serde_json::from_str::<T>(&json) {
            Ok(value) => return CacheResult::Found(value),
            Err(e) => e.to_string(),
        };
        tracing::debug!("Dropping undecodable cache entry {}: {}", key, error);
        self.remove(key).await;
        CacheResult::ExistsButNoValue
    }

    async fn insert_json<T: Serialize + Sync>(&self, key: String, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(json) => self.insert_raw(key, json, ttl).await,
            Err(e) => tracing::error!("Failed to serialize cache entry {}: {}", key, e),
        }
    }
}

impl<C: ObjectCache + ?Sized> ObjectCacheExt for C {}

/// 声明缓存插件，进程启动时自动注册到插件表
///
/// 类型需要提供 `async fn new_async() -> Result<Self, String>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| -> $crate::cache::register::BoxedObjectCacheFuture {
                    Box::pin(async {
                        let cache = <$ty>::new_async()
                            .await
                            .map_err($crate::errors::GitClassroomsError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                }),
            );
        }
    };
}
