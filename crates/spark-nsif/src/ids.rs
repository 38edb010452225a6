//! 标识与键区间的基础类型。
//!
//! # 定位（Why）
//! - `TableId`/`MachineId`/`PeerId` 对上层而言均为不透明标识，仓储本身不解释其内部含义，
//!   仅用作并发安全的 map 键；
//! - `KeyRange` 承载半开区间 `[start, end)`，供 [`crate::region_map::RegionMap`] 作为键使用。
//!
//! # 契约（What）
//! - 三类 Id 均为 `Copy + Eq + Hash + Ord`，可安全跨线程复制（值语义，不持有共享状态）；
//! - `KeyRange` 的析取性（不重叠、覆盖键空间）由调用方（`SemilatticeView` 的实现者）保证，
//!   本仓储不做运行期校验。

use std::fmt;
use std::sync::Arc;

/// 表标识，全局唯一。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u64);

/// 集群节点标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(pub u64);

/// 已连接对端进程标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u64);

/// 键空间上的半开区间 `[start, end)`。
///
/// # 排序约定（How）
/// - `Ord` 按 `start` 优先比较，`end` 作为次级键；这对 `RegionMap` 内部按起点排序存储
///   已经足够，析取性假设下 `end` 的比较结果不会影响查找正确性。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyRange {
    start: Arc<[u8]>,
    end: Arc<[u8]>,
}

impl KeyRange {
    /// 构造一个 `[start, end)` 区间；调用方需保证 `start <= end`。
    pub fn new(start: impl Into<Arc<[u8]>>, end: impl Into<Arc<[u8]>>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn start(&self) -> &[u8] {
        &self.start
    }

    pub fn end(&self) -> &[u8] {
        &self.end
    }

    /// 判断给定键是否落入本区间。
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= &*self.start && key < &*self.end
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?})", self.start, self.end)
    }
}
