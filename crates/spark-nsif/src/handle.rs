//! 访问句柄：`get_namespace_interface` 返回给调用方的引用计数持有者。
//!
//! # 契约（What）
//! - 构造时调用一次 [`CacheEntry::add_ref`]，析构时调用一次 [`CacheEntry::release`]（§6）；
//! - 两者都必须发生在条目的所属线程上——由于 [`AccessHandle`] 内部持有 `Rc`，它本身就不是
//!   `Send`，因此"离开所属线程"在编译期已经不可能发生，不需要运行期检查。

use std::rc::Rc;

use crate::entry::CacheEntry;
use crate::ids::TableId;
use crate::namespace_interface::NamespaceInterface;

/// 对一个存活中命名空间接口的引用计数持有者。
pub struct AccessHandle {
    interface: Rc<dyn NamespaceInterface>,
    entry: Rc<CacheEntry>,
}

impl AccessHandle {
    /// 仅供 [`crate::repository::NamespaceInterfaceRepository::get_namespace_interface`] 调用；
    /// 调用方必须已经在 `entry` 上成功等到 `interface_slot` 就绪。
    pub(crate) fn new(interface: Rc<dyn NamespaceInterface>, entry: Rc<CacheEntry>) -> Self {
        entry.add_ref();
        Self { interface, entry }
    }

    pub fn table(&self) -> TableId {
        self.entry.table()
    }

    /// 借出底层接口；调用方可以安全地多次借用，因为句柄本身保证接口在其生命周期内存活。
    pub fn interface(&self) -> &dyn NamespaceInterface {
        self.interface.as_ref()
    }
}

impl Clone for AccessHandle {
    fn clone(&self) -> Self {
        self.entry.add_ref();
        Self {
            interface: Rc::clone(&self.interface),
            entry: Rc::clone(&self.entry),
        }
    }
}

impl Drop for AccessHandle {
    fn drop(&mut self) {
        self.entry.release();
    }
}
