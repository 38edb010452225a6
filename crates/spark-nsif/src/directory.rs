//! 目录与半格视图契约（外部协作方）。
//!
//! # 定位（Where）
//! - `SemilatticeView` 对应 §6 中发布 `TableId -> {deleted?, blueprint}` 快照与变更通知的组件；
//!   [`crate::projector::DirectoryProjector`]（C2）是它唯一的消费者；
//! - `DirectoryWatchable` 对应发布 `PeerId -> {reactor_bcards}` 的组件；[`crate::lifecycle`]
//!   （C4 第一阶段）用它派生出单表、跨线程可共享的 `TableReactorWatch`。
//!
//! 两者均只按契约建模——本仓储既不解释 `ReactorCard` 的内部字节，也不负责通过网络拉取这些
//! 快照；真实实现位于仓储之外。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ids::{MachineId, PeerId, TableId};
use crate::region_map::RegionMap;

/// 一条 Blueprint 记录的角色；仓储只关心是否为 `Primary`。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Role {
    Primary,
    Secondary,
}

/// 一张表的权威角色分配。
#[derive(Clone, Debug, Default)]
pub struct Blueprint {
    /// 反应堆在冲突解决期间不会变更角色分配；为 `true` 时，投影器保留该表此前的映射。
    pub in_conflict: bool,
    pub machines_roles: HashMap<MachineId, RegionMap<Role>>,
}

/// 一张表的元数据快照条目。
#[derive(Clone, Debug, Default)]
pub struct TableMetadata {
    pub deleted: bool,
    pub blueprint: Blueprint,
}

/// `SemilatticeView` 发布的全表元数据快照。
pub type TableSnapshot = HashMap<TableId, TableMetadata>;

/// 目录发布的、按对端过滤前的完整反应堆通告集合。
pub type ReactorCard = Arc<[u8]>;

/// 发布集群全部表元数据快照与变更通知的视图。
///
/// # 契约（What）
/// - `snapshot` 必须是一次性、一致的读取，不应在遍历期间发生部分更新；
/// - `changed` 在下一次快照相较上次调用发生变化后才返回；实现应保证不会漏掉在两次调用之间
///   发生的变更（常见做法是内部使用 `tokio::sync::watch` 或等价机制）。
#[async_trait]
pub trait SemilatticeView: Send + Sync + 'static {
    fn snapshot(&self) -> TableSnapshot;

    async fn changed(&self);
}

/// 单个对端的目录元数据，按表索引反应堆通告。
#[derive(Clone, Debug, Default)]
pub struct DirectoryMetadata {
    pub reactor_bcards: HashMap<TableId, ReactorCard>,
}

/// 针对单张表过滤后的反应堆通告视图，跨线程共享。
///
/// # 设计意图（Why）
/// - 这是 §5 中唯一被允许跨越工作线程边界的共享可变状态；命名空间接口在其构造阶段取得一份
///   `Arc`，此后通过 `changed()` 自行订阅更新，不再需要仓储居中转发。
#[async_trait]
pub trait TableReactorWatch: Send + Sync + 'static {
    fn current(&self) -> Arc<HashMap<PeerId, ReactorCard>>;

    async fn changed(&self);
}

/// 发布 `PeerId -> DirectoryMetadata` 并能派生单表过滤视图的目录组件。
#[async_trait]
pub trait DirectoryWatchable: Send + Sync + 'static {
    /// 为指定表构造一个跨线程可共享的过滤视图。
    ///
    /// # 前置条件（Where this runs）
    /// - C4 第一阶段规定此调用必须发生在仓储的主线程（home thread）上；本 trait 自身不强制
    ///   这一点，调用方（[`crate::lifecycle`]）负责通过工作线程池完成线程切换。
    fn watch_table(&self, table: TableId) -> Arc<dyn TableReactorWatch>;
}
