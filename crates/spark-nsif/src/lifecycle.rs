//! 条目生命周期任务（C4）：每个新条目唯一对应的协作式任务，负责构造、发布、保活与收尾。
//!
//! # 执行逻辑（How）
//! 严格按六个阶段推进，阶段编号与注释对应一一对应：
//! 1. 跨线程准备——借助工作线程池把"在宿主线程上构造跨线程可观察对象"这件事实现为
//!    "向宿主线程投递一个任务，通过一次性通道取回结果"，而不是真的把本任务本身搬到另一个
//!    线程上继续跑（§5 的迁移语义在外部看来等价：构造动作确实发生在宿主线程上）；
//! 2. 接口构造——在所属线程上同步调用注入的工厂；
//! 3. 等待就绪——与排空信号竞速；排空先发生则直接跳到第 6 阶段，接口被悄悄丢弃；
//! 4. 发布——脉冲 `interface_slot`，所有等待中的 `get` 调用方被释放；
//! 5. 保活循环——`ref_count` 在零与非零之间的穿越驱动一个嵌套等待，内层等待降到零，
//!    外层在"定时器 vs 重新变为非零 vs 排空"之间竞速；
//! 6. 收尾——前置条件 `ref_count == 0` 必然成立（排空路径由 I6 保证，过期路径由构造保证），
//!    从条目表中移除本条目（不得在移除前后跨越任何 `.await`，避免并发 `get` 观察到半拆除状态）。

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::cancellation::CancellationSignal;
use crate::directory::{DirectoryWatchable, TableReactorWatch};
use crate::drain::DrainToken;
use crate::entry::CacheEntry;
use crate::ids::TableId;
use crate::messaging::MessagingHandle;
use crate::namespace_interface::{NamespaceInterfaceFactory, SharedContext};
use crate::thread_state::{self, RegionMapHandle};
use crate::worker::WorkerId;
use crate::worker::WorkerPool;

/// 一次 C4 派生所需的全部协作方与参数。
pub(crate) struct LifecycleContext {
    pub table: TableId,
    pub entry: Rc<CacheEntry>,
    pub pool: Arc<WorkerPool>,
    pub home_worker: WorkerId,
    pub messaging: Arc<dyn MessagingHandle>,
    pub factory: Arc<dyn NamespaceInterfaceFactory>,
    pub directory: Arc<dyn DirectoryWatchable>,
    pub shared_context: SharedContext,
    pub drain_signal: CancellationSignal,
    pub drain_token: DrainToken,
    pub expiration: Duration,
}

/// 在调用方当前所在的 `LocalSet` 上派生 C4 任务；调用方必须已经运行在条目的所属工作线程上。
pub(crate) fn spawn(ctx: LifecycleContext) {
    tokio::task::spawn_local(run(ctx));
}

#[instrument(name = "nsif.entry", skip_all, fields(table = ctx.table.0))]
async fn run(ctx: LifecycleContext) {
    let LifecycleContext {
        table,
        entry,
        pool,
        home_worker,
        messaging,
        factory,
        directory,
        shared_context,
        drain_signal,
        drain_token,
        expiration,
    } = ctx;

    // 阶段 1：跨线程准备。
    let reactor_watch = construct_reactor_watch(&pool, home_worker, directory, table).await;

    // 阶段 2：接口构造。`region_map` 是绑定到本线程 C1 存储的活句柄，不是一份快照拷贝，
    // 发布之后接口仍可通过反复调用它观察到后续的投影刷新。
    let region_map = RegionMapHandle::new(table);
    let interface = factory
        .construct(table, messaging, region_map, reactor_watch, shared_context)
        .await;

    // 阶段 3：等待就绪，受排空信号约束。
    tokio::select! {
        () = interface.wait_ready() => {}
        () = drain_signal.cancelled() => {
            debug!(target: "nsif.entry", ?table, "drained while awaiting readiness, no handle ever published");
            teardown(table, drain_token);
            return;
        }
    }

    // 阶段 4：发布。
    entry.publish(interface);
    info!(target: "nsif.entry", ?table, "namespace interface published");

    // 阶段 5：保活循环。
    let outcome = keep_alive(&entry, &drain_signal, expiration).await;
    match outcome {
        KeepAliveOutcome::Expired => {
            debug!(target: "nsif.entry", ?table, "idle expiration elapsed, tearing down");
        }
        KeepAliveOutcome::Drained => {
            debug!(target: "nsif.entry", ?table, "drained during keep-alive, tearing down");
        }
    }

    // 阶段 6：收尾。
    assert_eq!(
        entry.ref_count(),
        0,
        "teardown invariant violated: ref_count != 0 for table {table:?}"
    );
    teardown(table, drain_token);
}

fn teardown(table: TableId, drain_token: DrainToken) {
    let removed = thread_state::remove_entry(table);
    assert!(
        removed.is_some(),
        "C4 teardown for table {table:?} could not find its own entry — I1 violated"
    );
    drop(drain_token);
}

async fn construct_reactor_watch(
    pool: &WorkerPool,
    home_worker: WorkerId,
    directory: Arc<dyn DirectoryWatchable>,
    table: TableId,
) -> Arc<dyn TableReactorWatch> {
    pool.call_on(home_worker, move || async move { directory.watch_table(table) })
        .await
}

enum KeepAliveOutcome {
    Expired,
    Drained,
}

async fn keep_alive(
    entry: &CacheEntry,
    drain_signal: &CancellationSignal,
    expiration: Duration,
) -> KeepAliveOutcome {
    loop {
        while entry.ref_count() > 0 {
            tokio::select! {
                () = entry.wait_for_zero() => {}
                () = drain_signal.cancelled() => return KeepAliveOutcome::Drained,
            }
        }

        tokio::select! {
            () = tokio::time::sleep(expiration) => return KeepAliveOutcome::Expired,
            () = entry.wait_for_nonzero() => continue,
            () = drain_signal.cancelled() => return KeepAliveOutcome::Drained,
        }
    }
}
