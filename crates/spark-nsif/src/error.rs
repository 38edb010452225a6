//! 仓储对外暴露的错误域。
//!
//! # 教案式说明
//! - **意图 (Why)**：区分"调用方可恢复"与"进程致命"两类失败；前者由 [`NsifError`] 表达，
//!   后者按照规约直接 panic（引用计数越界、`interface_slot` 重复发布等），不可恢复亦不应被
//!   调用方吞掉；
//! - **参照 (Where)**：枚举形态沿用 `spark-switch::error::SwitchError` 的风格——每个变体携带
//!   足够的上下文，派生 `thiserror::Error` 以兼容 `std::error::Error`；
//! - **范围 (What)**：目前仅有一个可恢复变体 `Cancelled`，对应 §7 中“调用方中断”的场景；
//!   `Drained` 不在此枚举中出现，它只是 C4 内部的控制流信号，不向 `get` 调用方传播。

use thiserror::Error;

use crate::ids::TableId;

/// 仓储对外暴露的错误类型。
#[derive(Debug, Clone, Error)]
pub enum NsifError {
    /// 调用方传入的 [`crate::cancellation::CancellationSignal`] 在等待 `interface_slot`
    /// 就绪前被触发。
    ///
    /// - **契约**：入口条目本身不受影响，既不会被创建，也不会被提前回收——`get` 只是放弃
    ///   了这一次等待，条目的生命周期仍由其 C4 任务独立决定。
    #[error("get_namespace_interface for table {table:?} was cancelled before readiness")]
    Cancelled { table: TableId },
}
