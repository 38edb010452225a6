//! 仓储配置层。
//!
//! # 定位（Why）
//! - §6 把空闲回收窗口描述为一个"固定"常量 [`NAMESPACE_INTERFACE_EXPIRATION_MS`]；生产代码
//!   路径应当始终使用它。测试需要在几毫秒内观察到过期与续期，因此 [`RepositoryConfig`] 把这个
//!   值做成字段，默认取规约常量，仅暴露一个显式标注"仅供测试"的覆盖入口，避免生产调用方
//!   无意中把它当作稳定可调参数。

use std::time::Duration;

/// 空闲命名空间接口的保留窗口，固定为 60 秒（见 §6）。
pub const NAMESPACE_INTERFACE_EXPIRATION_MS: u64 = 60_000;

/// 仓储的运行期配置。
#[derive(Clone, Copy, Debug)]
pub struct RepositoryConfig {
    expiration: Duration,
    worker_count: usize,
}

impl RepositoryConfig {
    /// 工作线程数量，即 §2 中"有界工作线程集合"的基数。
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// 构造使用指定工作线程数、生产默认过期窗口的配置。
    pub fn with_worker_count(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// 仅供测试使用：覆盖空闲过期窗口，避免集成测试等待真实的 60 秒。
    #[doc(hidden)]
    pub fn with_expiration_for_tests(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_millis(NAMESPACE_INTERFACE_EXPIRATION_MS),
            worker_count: 2,
        }
    }
}
