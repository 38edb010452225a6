//! 目录投影器（C2）：把半格视图的变更通知转换成每个工作线程 C1 存储的一次整体替换。
//!
//! # 执行逻辑（How）
//! - 每次收到变更通知，先在仓储的宿主线程上一次性算出两样东西：非冲突表的全新投影
//!   `fresh`，以及处于冲突状态的表集合 `conflicted`——这部分对所有工作线程完全相同，只算
//!   一次；
//! - 随后给每个工作线程各投递一个任务：该任务读取*这个线程自己*当前的区域映射存储，为
//!   `conflicted` 中的每张表取出它在本线程上的既有映射（如果有的话）叠加到 `fresh` 之上，
//!   再整体替换掉本线程的存储。`in_conflict` 表保留"这个线程上一次看到的值"而不是某个全局
//!   统一的历史值，是刻意的：不同线程的 C1 在冲突发生前完全可能处于不同的发布时序点上，
//!   §4.2 的"拷贝当前线程既有映射"只有逐线程求值才有意义。

use std::sync::Arc;

use tracing::{debug, info};

use crate::cancellation::CancellationSignal;
use crate::directory::{Role, SemilatticeView};
use crate::ids::TableId;
use crate::region_map::RegionMap;
use crate::thread_state::{self, PrimaryProjection};
use crate::worker::WorkerPool;

/// 订阅半格视图、驱动每个工作线程 C1 刷新的投影器。
pub struct DirectoryProjector {
    view: Arc<dyn SemilatticeView>,
    pool: Arc<WorkerPool>,
    cancel: CancellationSignal,
}

impl DirectoryProjector {
    pub fn new(
        view: Arc<dyn SemilatticeView>,
        pool: Arc<WorkerPool>,
        cancel: CancellationSignal,
    ) -> Self {
        Self { view, pool, cancel }
    }

    /// 立即做一次刷新，随后在每次变更通知或取消之间循环，直至收到取消信号。
    ///
    /// 这是仓储构造时派生的长驻任务；它自身不持有排空令牌——它在 C5 析构时由第一步
    /// （"停止元数据订阅"）直接通过 `cancel` 终止，早于条目排空。
    pub async fn run(self) {
        self.refresh();
        loop {
            tokio::select! {
                () = self.view.changed() => {
                    self.refresh();
                }
                () = self.cancel.cancelled() => {
                    debug!(target: "nsif.projector", "projector subscription stopped");
                    return;
                }
            }
        }
    }

    fn refresh(&self) {
        let snapshot = self.view.snapshot();

        let mut fresh = PrimaryProjection::new();
        let mut conflicted = Vec::new();

        for (table, metadata) in snapshot.iter() {
            if metadata.deleted {
                continue;
            }
            if metadata.blueprint.in_conflict {
                conflicted.push(*table);
                continue;
            }

            let mut builder = RegionMap::builder();
            for (machine, regions) in &metadata.blueprint.machines_roles {
                for (range, role) in regions.iter() {
                    if *role == Role::Primary {
                        builder.insert(range.clone(), *machine);
                    }
                }
            }
            fresh.insert(*table, builder.build());
        }

        info!(
            target: "nsif.projector",
            tables = fresh.len(),
            conflicted = conflicted.len(),
            "publishing refreshed projection"
        );

        let fresh = Arc::new(fresh);
        let conflicted: Arc<[TableId]> = conflicted.into();

        self.pool.broadcast(move |_worker| {
            let fresh = Arc::clone(&fresh);
            let conflicted = Arc::clone(&conflicted);
            async move {
                let mut merged = (*fresh).clone();
                for table in conflicted.iter() {
                    if let Some(prior) = thread_state::region_map_for(*table) {
                        merged.insert(*table, prior);
                    }
                }
                thread_state::publish_projection(Arc::new(merged));
            }
        });
    }
}
