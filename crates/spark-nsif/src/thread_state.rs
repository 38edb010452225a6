//! 每个工作线程独立拥有的状态：C1 的区域映射存储与 C5 的条目表。
//!
//! # 架构定位（Where）
//! - 两者都只应被"运行在该线程上的任务"触碰（I2/I5），因此都以 `thread_local!` 落地，
//!   没有也不需要任何跨线程同步原语；
//! - 区域映射存储选用 `arc_swap::ArcSwap`，呼应 `spark-router::DefaultRouter` 的整表替换
//!   模式——即便此处天然单线程写入，保持同一种"发布即替换一整份不可变快照"的形状，使得
//!   C2（[`crate::projector`]）的发布代码与读路径之间没有除"读当前指针"之外的耦合。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::entry::CacheEntry;
use crate::ids::{MachineId, TableId};
use crate::region_map::RegionMap;

/// C2 为每张表派生的只读区域映射集合，整份替换。
pub type PrimaryProjection = HashMap<TableId, RegionMap<MachineId>>;

thread_local! {
    static REGION_STORE: ArcSwap<PrimaryProjection> =
        ArcSwap::from_pointee(PrimaryProjection::new());
    static ENTRY_MAP: RefCell<HashMap<TableId, Rc<CacheEntry>>> = RefCell::new(HashMap::new());
}

/// 读取当前线程此刻对某张表的区域映射快照；热路径，免锁。
pub fn region_map_for(table: TableId) -> Option<RegionMap<MachineId>> {
    REGION_STORE.with(|store| store.load().get(&table).cloned())
}

/// 绑定到单张表、"穿透读"当前线程 C1 存储的活句柄。
///
/// # 定位（Why）
/// - §2/§4.4 阶段 2 把命名空间接口描述为绑定到"线程的 C1 存储"本身，而不是构造那一刻的
///   一份快照拷贝——投影刷新后，已经发布的接口仍应在下次读取时看到最新映射；
/// - [`Self::current`] 每次调用都重新 `REGION_STORE.with(...)`，因此天然反映
///   [`publish_projection`] 之后发生的任意次替换，不需要为每次刷新重新构造句柄。
#[derive(Clone, Copy, Debug)]
pub struct RegionMapHandle {
    table: TableId,
}

impl RegionMapHandle {
    pub fn new(table: TableId) -> Self {
        Self { table }
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    /// 当前线程此刻对本句柄所绑定之表的区域映射；未知表返回空映射。
    pub fn current(&self) -> RegionMap<MachineId> {
        region_map_for(self.table).unwrap_or_else(RegionMap::empty)
    }
}

/// 用一份全新的投影整体替换当前线程的区域映射存储（仅应由 C2 派给该线程的任务调用）。
pub fn publish_projection(projection: Arc<PrimaryProjection>) {
    REGION_STORE.with(|store| store.store(projection));
}

/// 在当前线程的条目表中查找表对应的缓存条目。
pub fn lookup_entry(table: TableId) -> Option<Rc<CacheEntry>> {
    ENTRY_MAP.with(|map| map.borrow().get(&table).cloned())
}

/// 在当前线程的条目表中插入一个新条目；调用方负责保证 `table` 此前不存在。
///
/// # Panics
/// 若 `table` 已存在，说明 C5 的 find-or-create 逻辑出现了重复插入，这是不变量违反。
pub fn insert_entry(table: TableId, entry: Rc<CacheEntry>) {
    ENTRY_MAP.with(|map| {
        let previous = map.borrow_mut().insert(table, entry);
        assert!(
            previous.is_none(),
            "duplicate cache entry inserted for table {table:?}"
        );
    });
}

/// 从当前线程的条目表中移除一个条目；仅应由该条目的 C4 任务在收尾阶段调用（I1）。
pub fn remove_entry(table: TableId) -> Option<Rc<CacheEntry>> {
    ENTRY_MAP.with(|map| map.borrow_mut().remove(&table))
}

/// 当前线程条目表的条目数量；主要供测试与排空校验使用。
pub fn entry_count() -> usize {
    ENTRY_MAP.with(|map| map.borrow().len())
}
