//! 消息层契约（外部协作方，按契约而非实现建模）。
//!
//! 仓储自身从不调用 [`MessagingHandle`] 的任何方法——它只是把共享句柄原样转交给
//! [`crate::namespace_interface::NamespaceInterfaceFactory`]，由具体的命名空间接口实现
//! 决定如何用它联系副本。仓储只要求它可以安全地在多个线程间共享同一份 `Arc`。

/// 命名空间接口用来联系副本的消息句柄；对本仓储而言完全不透明。
pub trait MessagingHandle: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> MessagingHandle for T {}
