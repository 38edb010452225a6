#![deny(unsafe_code)]

//! # spark-nsif
//!
//! ## 定位与职责（Why）
//! - 这是一个按进程、按线程划分的缓存：为一组分布式表的命名空间接口（路由对象）代理构造、
//!   共享与回收，避免每次短生命周期的调用方都重新支付一次"订阅目录、建立反应堆通告监听"
//!   的代价；
//! - 本 crate 只管理生命周期与共享，不路由查询、不复制数据、不参与选主——那些都是命名空间
//!   接口自身的职责，本仓储把它当作一个不透明的、只关心其就绪信号的对象。
//!
//! ## 架构嵌入（Where）
//! - [`worker`] 是 C0：工作线程池的具体落地，其余所有模块假设"有界工作线程集合"已经存在，
//!   只有这个模块真正去启动 OS 线程；
//! - [`thread_state`] 是 C1 与 C5 条目表的具体存储：每个工作线程各自独立的区域映射存储与
//!   条目表，都以 `thread_local!` 落地；
//! - [`projector`] 是 C2：订阅半格视图，驱动每个工作线程 C1 的整体替换；
//! - [`entry`] 是 C3：一个表、一个线程、一个缓存条目，持有引用计数与两个边沿触发器；
//! - [`lifecycle`] 是 C4：每个条目唯一对应的协作式生命周期任务；
//! - [`repository`] 是 C5：对外暴露的门面，`get_namespace_interface` 与排空收尾都在这里；
//! - [`directory`]、[`messaging`]、[`namespace_interface`] 是本仓储消费但不实现的外部契约。
//!
//! ## 线程模型（Trade-offs）
//! - 条目、句柄、命名空间接口一律用 `Rc`/`Cell`/`RefCell` 持有，利用 `!Send` 在编译期排除
//!   跨线程访问，而不是依赖调用方自觉遵守"只在所属线程访问"的约定；
//! - 唯一被允许跨线程共享的可变状态是目录层派生的反应堆通告视图（见 [`directory::TableReactorWatch`]），
//!   它自带同步机制，是整个 crate 热路径上仅有的共享状态。

pub mod cancellation;
pub mod config;
pub mod directory;
pub mod drain;
pub mod entry;
pub mod error;
pub mod handle;
pub mod ids;
mod lifecycle;
pub mod messaging;
pub mod namespace_interface;
pub mod projector;
pub mod region_map;
pub mod repository;
pub mod thread_state;
pub mod worker;

pub use cancellation::CancellationSignal;
pub use config::{NAMESPACE_INTERFACE_EXPIRATION_MS, RepositoryConfig};
pub use error::NsifError;
pub use handle::AccessHandle;
pub use ids::{KeyRange, MachineId, PeerId, TableId};
pub use region_map::RegionMap;
pub use repository::NamespaceInterfaceRepository;
