//! 条目排空器（`EntryDrainer`）：把"广播关闭信号、等待所有受管对象完成"的协调模式收缩成一个
//! 计数闩锁，供 C5 在析构仓储时使用。
//!
//! # 定位（Where）
//! - 形态上对应 `spark-hosting::shutdown::GracefulShutdownCoordinator`——都是"注册目标、广播
//!   信号、等待收尾"的三段式协调器；区别在于那里按目标逐个等待并生成结构化报告，这里的受管
//!   对象（C4 任务）数量随 `get_namespace_interface` 动态增减，因此改用一个 `AtomicUsize` 计数
//!   闩锁加一个 `Notify`，等价于一个可等待的 WaitGroup；
//! - 每个 C4 任务在被 C5 派生时持有一个 [`DrainToken`]；任务结束、`DrainToken` 被丢弃时计数
//!   自减，归零时唤醒正在 [`EntryDrainer::drain`] 中等待的仓储析构逻辑。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::cancellation::CancellationSignal;

#[derive(Default)]
struct Shared {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// 面向仓储析构路径的排空协调器。
#[derive(Clone, Default)]
pub struct EntryDrainer {
    signal: CancellationSignal,
    shared: Arc<Shared>,
}

impl EntryDrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 仓储关停时 C4 任务应当观察的取消信号。
    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// 为一个新派生的 C4 任务注册一个排空令牌；计数加一。
    pub fn register(&self) -> DrainToken {
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        DrainToken {
            shared: Arc::clone(&self.shared),
        }
    }

    /// 当前仍在运行的 C4 任务数量；主要供日志/测试观察。
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// 广播取消信号，然后挂起直至所有已注册的 [`DrainToken`] 都已释放。
    ///
    /// `DrainToken::drop`（即唤醒方）运行在任意一个 C4 任务所属的工作线程上，与这里的
    /// 等待方天然跨线程——因此必须先 `enable()` 登记等待意图再检查计数，否则"检查、等待"
    /// 两步之间插入的一次 `drop` 会被 `Notify::notify_waiters()` 的"不残留许可"语义错过，
    /// 使 `drain()` 永久挂起。
    pub async fn drain(&self) {
        self.signal.cancel();
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// 绑定一个存活中 C4 任务的排空令牌；`Drop` 时计数自减，归零时唤醒 [`EntryDrainer::drain`]。
pub struct DrainToken {
    shared: Arc<Shared>,
}

impl Drop for DrainToken {
    fn drop(&mut self) {
        if self.shared.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_returns_immediately_with_no_registered_tokens() {
        let drainer = EntryDrainer::new();
        drainer.drain().await;
        assert!(drainer.signal().is_cancelled());
    }

    #[tokio::test]
    async fn drain_waits_for_outstanding_tokens_to_drop() {
        let drainer = EntryDrainer::new();
        let token = drainer.register();
        assert_eq!(drainer.outstanding(), 1);

        let drainer_clone = drainer.clone();
        let drain_task = tokio::spawn(async move {
            drainer_clone.drain().await;
        });

        tokio::task::yield_now().await;
        drop(token);
        drain_task.await.expect("drain task should not panic");
        assert_eq!(drainer.outstanding(), 0);
    }
}
