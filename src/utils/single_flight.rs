//! 按键合并并发调用
//!
//! 同一个键上正在进行的调用只执行一次，其余调用者等待并共享同一结果。
//! 仅在单进程内生效。

use std::future::Future;
use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

pub struct SingleFlight<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    calls: DashMap<K, Shared<BoxFuture<'static, V>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// 执行 `make` 产生的 future；如果同一个键已有调用在进行，则等待它的结果
    pub async fn run<F, Fut>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let call = match self.calls.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let call = make().boxed().shared();
                entry.insert(call.clone());
                call
            }
        };

        let result = call.clone().await;
        // 只移除自己等待的那一次调用
        self.calls.remove_if(&key, |_, current| current.ptr_eq(&call));
        result
    }

    /// 正在进行的调用数
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}
