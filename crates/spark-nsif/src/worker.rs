//! 工作线程池（C0）：规约假设"有界工作线程集合"已经存在；本 crate 独立分发时需要一个具体
//! 落地，这里提供最小实现——每个工作线程各自驱动一个单线程 Tokio 运行时与一个 `LocalSet`，
//! 线程之间通过 `mpsc` 通道投递"在目标线程上构造并 `spawn_local` 一个 future"的任务。
//!
//! # 设计取舍（Trade-offs）
//! - 规约中的"任务迁移到目标线程"在这里被实现为"向目标线程的队列投递一个新任务，并通过
//!   一次性通道把结果带回"，而不是真的挂起原任务、把它本身搬到另一个线程继续跑；两者对外
//!   可观察的效果一致（构造动作确实发生在目标线程上），差异只在于调用方要显式处理"等待结果"
//!   这一步，详见 [`crate::lifecycle`] 第一阶段；
//! - 每个线程各自的 `mpsc::UnboundedSender<Job>` 投递顺序即为该线程应用变更的顺序，天然满足
//!   §4.2/§5 要求的"多次变更通知必须按到达顺序应用到每个线程"。

use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

/// 工作线程在池中的序号，从 0 开始连续编号。
pub type WorkerId = usize;

thread_local! {
    static CURRENT_WORKER: Cell<Option<WorkerId>> = const { Cell::new(None) };
}

/// 若当前代码运行在某个 [`WorkerPool`] 派生的工作线程上，返回其 [`WorkerId`]。
pub fn current_worker() -> Option<WorkerId> {
    CURRENT_WORKER.with(|cell| cell.get())
}

enum Job {
    Run(Box<dyn FnOnce() + Send>),
    Shutdown,
}

/// 固定大小的工作线程池。
pub struct WorkerPool {
    senders: Vec<mpsc::UnboundedSender<Job>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// 启动 `worker_count` 个工作线程；`worker_count` 必须大于零。
    pub fn new(worker_count: usize) -> Arc<Self> {
        assert!(worker_count > 0, "worker pool 至少需要一个工作线程");

        let mut senders = Vec::with_capacity(worker_count);
        let mut threads = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let (tx, rx) = mpsc::unbounded_channel::<Job>();
            let handle = std::thread::Builder::new()
                .name(format!("nsif-worker-{id}"))
                .spawn(move || Self::run(id, rx))
                .expect("spawning an nsif worker thread should not fail");
            senders.push(tx);
            threads.push(handle);
        }

        Arc::new(Self {
            senders,
            threads: Mutex::new(threads),
        })
    }

    fn run(id: WorkerId, mut rx: mpsc::UnboundedReceiver<Job>) {
        CURRENT_WORKER.with(|cell| cell.set(Some(id)));
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("building a current-thread runtime for an nsif worker should not fail");
        let local = tokio::task::LocalSet::new();
        local.block_on(&rt, async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Run(f) => f(),
                    Job::Shutdown => break,
                }
            }
        });
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// 在目标工作线程上构造并提交一个本地任务。
    ///
    /// `make_fut` 本身必须是 `Send`（它要跨越通道投递到目标线程），但它返回的 `Future` 不必
    /// `Send`——这正是允许条目、命名空间接口等 `Rc` 持有的数据留在单线程内的关键。
    pub fn spawn_on<F, Fut>(&self, worker: WorkerId, make_fut: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let job = Job::Run(Box::new(move || {
            tokio::task::spawn_local(make_fut());
        }));
        // 对端线程若已经关闭，说明仓储正在关停或已经关停；静默丢弃即可，不是错误。
        let _ = self.senders[worker].send(job);
    }

    /// 向每个工作线程广播同一类任务（每次调用 `make_fut` 生成各自独立的 future 实例）。
    pub fn broadcast<F, Fut>(&self, mut make_fut: F)
    where
        F: FnMut(WorkerId) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        for worker in 0..self.worker_count() {
            let fut = make_fut(worker);
            self.spawn_on(worker, move || fut);
        }
    }

    /// 在目标工作线程上运行一个任务并取回结果；对 [`Self::spawn_on`] 加一根 `oneshot` 回传
    /// 通道。[`crate::lifecycle`] 第一阶段（跨线程构造反应堆视图）与
    /// [`crate::repository::NamespaceInterfaceRepository::run_on_worker`] 都基于这个原语，
    /// 对外呈现"把一段工作挪到某个工作线程上执行"的效果，而不需要真的迁移调用方所在的任务。
    ///
    /// `T` 必须是 `Send`，因为它要跨越 `oneshot` 通道从目标线程送回调用方所在的线程；`Fut`
    /// 本身不必是 `Send`，道理与 [`Self::spawn_on`] 相同。
    pub async fn call_on<F, Fut, T>(&self, worker: WorkerId, make_fut: F) -> T
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.spawn_on(worker, move || async move {
            let value = make_fut().await;
            let _ = tx.send(value);
        });
        rx.await
            .expect("worker thread dropped before producing a result")
    }

    /// 请求所有工作线程停止接收新任务并退出；已经投递但未执行的任务可能被丢弃。
    ///
    /// # 调用前提
    /// - 调用方（[`crate::repository::NamespaceInterfaceRepository`]）必须确保在调用此方法前
    ///   已经完成条目排空（见 §4.5 的关停顺序），否则仍在运行的 C4 任务会被强行中断而不是
    ///   走正常的收尾路径。
    pub fn shutdown(&self) {
        for sender in &self.senders {
            let _ = sender.send(Job::Shutdown);
        }
        let mut threads = self.threads.lock().expect("worker thread registry poisoned");
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }
}
