//! 仓储门面（C5）：`get_namespace_interface` 的 find-or-create 入口与析构时的排空收尾。
//!
//! # 架构定位（Where）
//! - 这是整个 crate 唯一对外公开的主入口；构造时注入全部外部协作方（消息句柄、半格视图、
//!   目录可观察对象、共享上下文），运行期只暴露一个异步方法和一个析构方法。

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::cancellation::CancellationSignal;
use crate::config::RepositoryConfig;
use crate::directory::{DirectoryWatchable, SemilatticeView};
use crate::drain::EntryDrainer;
use crate::entry::CacheEntry;
use crate::error::NsifError;
use crate::handle::AccessHandle;
use crate::ids::TableId;
use crate::lifecycle::{self, LifecycleContext};
use crate::messaging::MessagingHandle;
use crate::namespace_interface::{NamespaceInterfaceFactory, SharedContext};
use crate::projector::DirectoryProjector;
use crate::thread_state;
use crate::worker::WorkerPool;

/// 命名空间接口仓储：每进程持有一个，内部再按线程拆分缓存。
pub struct NamespaceInterfaceRepository {
    pool: Arc<WorkerPool>,
    home_worker: usize,
    messaging: Arc<dyn MessagingHandle>,
    factory: Arc<dyn NamespaceInterfaceFactory>,
    directory: Arc<dyn DirectoryWatchable>,
    shared_context: SharedContext,
    config: RepositoryConfig,
    projector_cancel: CancellationSignal,
    drainer: EntryDrainer,
}

impl NamespaceInterfaceRepository {
    /// 构造仓储：启动工作线程池、在线程 0 上派生投影器的长驻订阅任务。
    pub fn new(
        messaging: Arc<dyn MessagingHandle>,
        semilattice: Arc<dyn SemilatticeView>,
        directory: Arc<dyn DirectoryWatchable>,
        factory: Arc<dyn NamespaceInterfaceFactory>,
        shared_context: SharedContext,
        config: RepositoryConfig,
    ) -> Self {
        let pool = WorkerPool::new(config.worker_count());
        let home_worker = 0;
        let projector_cancel = CancellationSignal::new();

        let projector = DirectoryProjector::new(semilattice, Arc::clone(&pool), projector_cancel.clone());
        pool.spawn_on(home_worker, move || projector.run());

        Self {
            pool,
            home_worker,
            messaging,
            factory,
            directory,
            shared_context,
            config,
            projector_cancel,
            drainer: EntryDrainer::new(),
        }
    }

    /// 本仓储持有的工作线程数量（§2 中"有界工作线程集合"的基数）。
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// 在本仓储第 `worker` 号工作线程的 `LocalSet` 上运行一段调用方提供的工作并取回结果。
    ///
    /// # 用途
    /// [`Self::get_namespace_interface`] 只触碰调用方当前所在线程的本地状态，因此调用方必须
    /// 先"进入"本仓储的某个工作线程才能调用它；这个方法就是那个入口——对外表现为"把一段业务
    /// 逻辑搬到编号为 `worker` 的线程上执行"，内部仍然是投递任务加 `oneshot` 回传（见
    /// [`crate::worker::WorkerPool::call_on`]），并不真的挂起并搬运调用方自身的任务。
    pub async fn run_on_worker<F, Fut, T>(&self, worker: usize, make_fut: F) -> T
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + 'static,
        T: Send + 'static,
    {
        self.pool.call_on(worker, make_fut).await
    }

    /// 查找或创建调用方当前线程上该表的条目，然后等待其命名空间接口就绪。
    ///
    /// # 前置条件
    /// 调用方必须已经运行在本仓储某个工作线程的 `LocalSet` 内（由 [`WorkerPool::spawn_on`]
    /// 派生，或者是另一个 C4 任务）——本方法触碰线程本地状态，不做跨线程校验。
    #[instrument(name = "nsif.get", skip(self, interruptor), fields(table = table.0))]
    pub async fn get_namespace_interface(
        &self,
        table: TableId,
        interruptor: &CancellationSignal,
    ) -> Result<AccessHandle, NsifError> {
        // 步骤 1-3：非挂起区段内完成查找或创建，期间不允许出现任何 `.await`。
        let entry: Rc<CacheEntry> = match thread_state::lookup_entry(table) {
            Some(entry) => entry,
            None => {
                let entry = CacheEntry::new(table);
                thread_state::insert_entry(table, Rc::clone(&entry));
                lifecycle::spawn(LifecycleContext {
                    table,
                    entry: Rc::clone(&entry),
                    pool: Arc::clone(&self.pool),
                    home_worker: self.home_worker,
                    messaging: Arc::clone(&self.messaging),
                    factory: Arc::clone(&self.factory),
                    directory: Arc::clone(&self.directory),
                    shared_context: Arc::clone(&self.shared_context),
                    drain_signal: self.drainer.signal().clone(),
                    drain_token: self.drainer.register(),
                    expiration: self.config.expiration(),
                });
                entry
            }
        };

        // 步骤 4：挂起等待接口就绪，受调用方的中断信号约束。
        let interface = tokio::select! {
            interface = entry.interface_slot().wait() => interface,
            () = interruptor.cancelled() => {
                return Err(NsifError::Cancelled { table });
            }
        };

        // 步骤 5：构造句柄；其构造函数负责 `add_ref`。
        Ok(AccessHandle::new(interface, entry))
    }

    /// 关停顺序：先停止元数据订阅，再排空所有条目，最后回收工作线程池。
    ///
    /// 接受 `&self` 而非按值消费：内部三步都只通过共享引用操作（取消信号、排空闩锁、
    /// 线程池句柄均为内部可共享状态），调用方因此可以把仓储放在 `Arc` 里分发给每个工作
    /// 线程上的业务逻辑使用，再由任意一个持有者触发关停，而不必先收集回所有权。关停之后
    /// 仓储仍是一个合法但已空的值；再次调用 `get_namespace_interface` 属于调用方协议
    /// 违反（见 DESIGN.md「Open Questions resolved」）。
    #[instrument(name = "nsif.drain", skip(self))]
    pub async fn shutdown(&self) {
        self.projector_cancel.cancel();
        self.drainer.drain().await;
        info!(target: "nsif.drain", "all entries drained, shutting down worker pool");
        self.pool.shutdown();
    }
}
