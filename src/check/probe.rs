//! 探测策略接口
//!
//! 每种检测介质（HTTP 等）实现 [`Probe`]，只负责执行一次探测并返回结果；
//! 调度与状态记录由 [`Check`](crate::check::Check) 统一处理。

use crate::health::ProbeOutcome;
use async_trait::async_trait;

/// 探测策略trait
#[async_trait]
pub trait Probe: Send + Sync {
    /// 探测类型名称，与注册表中的 `type` 对应
    fn kind(&self) -> &'static str;

    /// 执行一次探测
    ///
    /// 探测失败以 `ProbeOutcome::failure` 的形式返回，不会作为错误抛出。
    async fn probe(&self) -> ProbeOutcome;
}
