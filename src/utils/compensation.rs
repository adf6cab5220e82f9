//! 补偿动作记录器
//!
//! 每个成功执行的步骤登记一个补偿动作；后续步骤失败时按登记的逆序执行补偿，
//! 尽力而为，补偿失败只记录日志。全部成功后调用 `commit` 丢弃补偿。

use std::fmt::Display;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

type Compensation<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

pub struct Compensator<E: 'static> {
    name: String,
    steps: Vec<(String, Compensation<E>)>,
}

impl<E: Display + Send + 'static> Compensator<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// 执行一个步骤，成功时登记它的补偿动作
    pub async fn execute<T, A, C, CFut>(
        &mut self,
        label: impl Into<String>,
        action: A,
        compensate: C,
    ) -> Result<T, E>
    where
        A: Future<Output = Result<T, E>>,
        C: FnOnce() -> CFut + Send + 'static,
        CFut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let value = action.await?;
        self.record(label, compensate);
        Ok(value)
    }

    /// 为已经完成的步骤登记补偿动作（补偿依赖步骤的返回值时使用）
    pub fn record<C, CFut>(&mut self, label: impl Into<String>, compensate: C)
    where
        C: FnOnce() -> CFut + Send + 'static,
        CFut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.steps
            .push((label.into(), Box::new(move || compensate().boxed())));
    }

    /// 已登记的补偿数量
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 逆序执行全部补偿，返回失败的补偿数量
    pub async fn rollback(mut self) -> usize {
        let steps = std::mem::take(&mut self.steps);
        warn!("{}: 回滚 {} 个已完成的步骤", self.name, steps.len());

        let mut failed = 0;
        for (label, compensate) in steps.into_iter().rev() {
            match compensate().await {
                Ok(()) => debug!("{}: 已补偿 {}", self.name, label),
                Err(e) => {
                    failed += 1;
                    warn!("{}: 补偿 {} 失败: {}", self.name, label, e);
                }
            }
        }
        failed
    }

    /// 全部成功，丢弃补偿
    pub fn commit(mut self) {
        self.steps.clear();
    }
}

impl<E: 'static> Drop for Compensator<E> {
    fn drop(&mut self) {
        if !self.steps.is_empty() {
            warn!(
                "{}: 丢弃了 {} 个未执行的补偿动作",
                self.name,
                self.steps.len()
            );
        }
    }
}
