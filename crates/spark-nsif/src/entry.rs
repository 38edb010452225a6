//! 缓存条目（C3）：每条目持有一个一次性发布、可多次等待的接口槽，外加一对只在 0↔1 穿越时
//! 触发的边沿通知。
//!
//! # 教案式说明
//! - **意图 (Why)**：§3 把 `ref_count` 描述为"只在条目所属线程上修改"，把两个通知描述为
//!   "可选、由跨越 0↔1 的那一次操作脉冲一次"；用 `Cell`/`RefCell` 而非原子量/锁表达前者，
//!   编译期即排除跨线程访问的可能，而不仅仅是约定；
//! - **实现取舍 (How)**：§9 把边沿通知建议为"等待方安装、变更方脉冲的一次性通道"；这里没有
//!   为每次等待都分配一个新的 `oneshot`，而是让 `zero`/`nonzero` 各自持有一个常驻
//!   `tokio::sync::Notify`，靠"先取 `notified()` 句柄、再复查谓词"的惯用法达到同样的
//!   不丢失唤醒保证——`Notify::notify_waiters` 只唤醒当前已经挂起的等待者，不会为后来者
//!   残留一个许可，因此语义仍然是边沿触发而非电平触发。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;

use crate::ids::TableId;
use crate::namespace_interface::NamespaceInterface;

/// 命名空间接口的一次性发布槽；可被多个 `get` 调用方并发等待。
pub struct InterfaceSlot {
    interface: RefCell<Option<Rc<dyn NamespaceInterface>>>,
    notify: Notify,
}

impl InterfaceSlot {
    fn new() -> Self {
        Self {
            interface: RefCell::new(None),
            notify: Notify::new(),
        }
    }

    /// 发布接口，唤醒所有当前正在 [`Self::wait`] 的调用方。
    ///
    /// # Panics
    /// 重复发布是 I3 的违反，属于进程致命的不变量破坏，直接 panic。
    fn pulse(&self, interface: Rc<dyn NamespaceInterface>) {
        let mut slot = self.interface.borrow_mut();
        assert!(
            slot.is_none(),
            "interface_slot pulsed twice — I3 violated"
        );
        *slot = Some(interface);
        drop(slot);
        self.notify.notify_waiters();
    }

    /// 挂起直至接口发布；若调用时已经发布，立即返回而不挂起。
    pub async fn wait(&self) -> Rc<dyn NamespaceInterface> {
        loop {
            if let Some(interface) = self.interface.borrow().as_ref() {
                return Rc::clone(interface);
            }
            let notified = self.notify.notified();
            if let Some(interface) = self.interface.borrow().as_ref() {
                return Rc::clone(interface);
            }
            notified.await;
        }
    }
}

/// 每表、每线程一个的缓存条目；只在其所属线程上被触碰。
pub struct CacheEntry {
    table: TableId,
    ref_count: Cell<u32>,
    notify_zero: Notify,
    notify_nonzero: Notify,
    interface_slot: InterfaceSlot,
}

impl CacheEntry {
    pub fn new(table: TableId) -> Rc<Self> {
        Rc::new(Self {
            table,
            ref_count: Cell::new(0),
            notify_zero: Notify::new(),
            notify_nonzero: Notify::new(),
            interface_slot: InterfaceSlot::new(),
        })
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    pub fn interface_slot(&self) -> &InterfaceSlot {
        &self.interface_slot
    }

    /// 仅供 C4 在发布阶段调用一次。
    pub(crate) fn publish(&self, interface: Rc<dyn NamespaceInterface>) {
        self.interface_slot.pulse(interface);
    }

    /// 增加引用计数；若发生 0→1 穿越，脉冲 `notify_nonzero`。从不挂起。
    pub fn add_ref(&self) {
        let before = self.ref_count.get();
        self.ref_count.set(before + 1);
        if before == 0 {
            self.notify_nonzero.notify_waiters();
        }
    }

    /// 减少引用计数；若落到 0，脉冲 `notify_zero`。从不挂起。
    ///
    /// # Panics
    /// 对 `ref_count == 0` 的条目调用属于调用方协议违反（I2 的配对不平衡），直接 panic。
    pub fn release(&self) {
        let before = self.ref_count.get();
        assert!(before > 0, "release() called with ref_count already 0");
        self.ref_count.set(before - 1);
        if before == 1 {
            self.notify_zero.notify_waiters();
        }
    }

    /// 挂起直至 `ref_count` 跌落到 0；若调用时已经是 0，立即返回。
    pub async fn wait_for_zero(&self) {
        loop {
            if self.ref_count.get() == 0 {
                return;
            }
            let notified = self.notify_zero.notified();
            if self.ref_count.get() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// 挂起直至 `ref_count` 从 0 升至非零；若调用时已经非零，立即返回。
    pub async fn wait_for_nonzero(&self) {
        loop {
            if self.ref_count.get() > 0 {
                return;
            }
            let notified = self.notify_nonzero.notified();
            if self.ref_count.get() > 0 {
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
    fn add_ref_and_release_balance_leaves_zero() {
        let entry = CacheEntry::new(TableId(1));
        for _ in 0..5 {
            entry.add_ref();
        }
        assert_eq!(entry.ref_count(), 5);
        for _ in 0..5 {
            entry.release();
        }
        assert_eq!(entry.ref_count(), 0);
    }

    #[test]
    #[should_panic(expected = "ref_count already 0")]
    fn release_without_add_ref_panics() {
        let entry = CacheEntry::new(TableId(1));
        entry.release();
    }

    #[tokio::test]
    async fn wait_for_zero_returns_immediately_when_already_zero() {
        let entry = CacheEntry::new(TableId(1));
        entry.wait_for_zero().await;
    }

    #[tokio::test]
    async fn wait_for_nonzero_unblocks_on_add_ref() {
        let entry = CacheEntry::new(TableId(1));
        assert_eq!(entry.ref_count(), 0);
        entry.add_ref();
        assert_eq!(entry.ref_count(), 1);
        entry.wait_for_nonzero().await;
    }

    #[test]
    #[should_panic(expected = "pulsed twice")]
    fn interface_slot_double_publish_panics() {
        struct Stub;
        #[async_trait::async_trait(?Send)]
        impl NamespaceInterface for Stub {
            async fn wait_ready(&self) {}
        }
        let slot = InterfaceSlot::new();
        slot.pulse(Rc::new(Stub));
        slot.pulse(Rc::new(Stub));
    }
}
