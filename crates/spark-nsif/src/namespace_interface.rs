//! 命名空间接口契约与其构造工厂。
//!
//! # 定位（Where）
//! - `NamespaceInterface` 是 §1 中明确划为"外部"的路由对象：本仓储只管理其生命周期，从不
//!   调用其读写 API；
//! - `NamespaceInterfaceFactory` 是仓储与具体实现之间唯一的缝合点，形态上对应
//!   `spark-router::ServiceFactory`——把"如何构造"这件事完全交给调用方注入的工厂，仓储本身
//!   不知道、也不需要知道构造细节。
//!
//! # 线程亲和性（Thread affinity）
//! - `NamespaceInterface` 刻意不要求 `Send`/`Sync`：按照 §3 的生命周期约定，它只存活在拥有
//!   该条目的 C4 任务栈帧内，永远不会离开所在线程，因此用 `Rc` 而非 `Arc` 持有；
//! - `NamespaceInterfaceFactory` 则要求 `Send + Sync`，因为同一个工厂实例会被每个工作线程
//!   各自的 C4 任务并发调用（构造调用本身仍然只在目标线程上执行，工厂对象只是被共享读取）。

use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;

use crate::directory::TableReactorWatch;
use crate::ids::TableId;
use crate::messaging::MessagingHandle;
use crate::thread_state::RegionMapHandle;

/// 调用方在构造仓储时注入的、与业务相关的共享上下文，仓储原样透传，不做解释。
pub type SharedContext = Arc<dyn core::any::Any + Send + Sync>;

/// 命名空间接口：对外暴露读写路由能力的对象，按契约建模，仓储只关心其初始就绪信号。
#[async_trait(?Send)]
pub trait NamespaceInterface: 'static {
    /// 挂起直至接口完成初次构造并可以安全对外发布。
    ///
    /// # 取消（Cancellation）
    /// - C4 第三阶段会把这个 future 和条目的排空信号一起 `select`；实现本身不需要关心取消，
    ///   只需要这个 future 在真正就绪前保持挂起即可。
    async fn wait_ready(&self);
}

/// 按表构造 [`NamespaceInterface`] 的工厂，由调用方实现并注入仓储。
#[async_trait(?Send)]
pub trait NamespaceInterfaceFactory: Send + Sync + 'static {
    /// 构造一个绑定到指定表的命名空间接口。
    ///
    /// # 参数
    /// - `table`：目标表标识；
    /// - `messaging`：消息句柄，透传给接口实现，用于联系副本；
    /// - `region_map`：绑定到当前线程 C1 存储的活句柄，而非构造那一刻的一份快照拷贝——
    ///   `region_map.current()` 每次调用都穿透读取线程当前的区域映射存储，因此接口在构造
    ///   完成、发布之后仍能通过反复调用这个句柄观察到之后每一次投影刷新（§2："已构造的接口
    ///   通过构造时订阅的可观察对象看到更新"；§4.4 阶段 2："绑定到……该线程的 C1 存储"本身，
    ///   而不是某一时刻的拷贝）；
    /// - `reactor_watch`：过滤到该表的跨线程反应堆通告视图；
    /// - `shared_context`：构造仓储时注入的共享上下文。
    ///
    /// # 后置条件
    /// - 返回的对象此后只会在当前线程被访问，其 `wait_ready` 应当对应 §4.4 阶段 3 所等待的
    ///   "初始就绪信号"。
    async fn construct(
        &self,
        table: TableId,
        messaging: Arc<dyn MessagingHandle>,
        region_map: RegionMapHandle,
        reactor_watch: Arc<dyn TableReactorWatch>,
        shared_context: SharedContext,
    ) -> Rc<dyn NamespaceInterface>;
}
