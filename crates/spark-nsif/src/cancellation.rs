//! 可等待的取消原语。
//!
//! # 设计背景（Why）
//! - `spark-core::contract::Cancellation`（见该 crate `src/contract.rs`）用一个原子布尔量表达
//!   取消状态，但只支持轮询（`is_cancelled`），没有办法让一个挂起的任务直接在取消发生时被唤醒；
//! - §5 要求“每一个阻塞等待都接受一个取消信号”，也就是说取消必须能和其它 `Future` 一起参与
//!   `select`，因此这里在原子标志之上叠加一个 [`tokio::sync::Notify`]，把"轮询原语"升级成
//!   "可等待原语"，其余克隆/派生语义与原版保持一致。
//!
//! # 契约（What）
//! - `cancel()` 首次调用返回 `true` 并唤醒所有当前正在 `cancelled().await` 的任务；
//! - 克隆得到的 `CancellationSignal` 共享同一块状态，取消对所有克隆体可见。
//!
//! # 跨线程唤醒竞态（Pitfall）
//! - 本类型是 `Send + Sync`，`cancel()` 与 `cancelled()` 可能分别运行在不同的工作线程上——
//!   不同于 [`crate::entry::CacheEntry`]（见该模块文档：仅在单一所属线程上被触碰，两次检查
//!   之间不可能插入别的代码），这里"取 `notified()` 句柄、检查谓词"两步之间确实可能被另一
//!   个线程的 `cancel()` 抢先，而 `Notify::notify_waiters()` 只唤醒*当时已经登记等待*的
//!   任务、不残留许可，因此必须先显式 `enable()` 登记等待意图，再检查谓词，二者之间的
//!   `cancel()` 才不会被错过。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

/// 可被多个任务共享、可等待的取消令牌。
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否已被取消；不挂起，供热路径快速检查。
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// 标记取消并唤醒所有正在等待的任务；重复调用返回 `false`。
    pub fn cancel(&self) -> bool {
        let first = self
            .inner
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// 挂起直至取消发生；若调用时已处于取消状态，立即返回。
    ///
    /// `cancel()` 可能在任意其它工作线程上调用，因此先 `enable()` 登记等待意图、再检查
    /// 状态，覆盖"登记与检查之间插入一次 `cancel()`"的窗口——`enable()` 之后发生的
    /// `notify_waiters()` 保证会被这次 `.await` 观察到，配合随后的状态检查兜底"`enable()`
    /// 之前就已经取消"的情形，两者合起来不丢失任何一次跨线程的取消。
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_signal_is_not_cancelled() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn cancel_reports_first_caller_and_is_idempotent_after() {
        let signal = CancellationSignal::new();
        assert!(signal.cancel(), "first cancel() call should report true");
        assert!(!signal.cancel(), "repeated cancel() calls should report false");
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_if_already_cancelled() {
        let signal = CancellationSignal::new();
        signal.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), signal.cancelled())
            .await
            .expect("cancelled() must not block once the signal has already fired");
    }

    #[tokio::test]
    async fn cancelled_wakes_a_waiter_when_cancel_is_called_later() {
        let signal = CancellationSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        tokio::task::yield_now().await;
        signal.cancel();
        task.await.expect("waiting task should observe the cancellation and exit");
    }

    #[tokio::test]
    async fn clones_share_the_same_underlying_state() {
        let signal = CancellationSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled(), "cancellation through a clone must be visible on the original");
    }
}
