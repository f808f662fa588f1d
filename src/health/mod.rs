//! 健康检测模块
//!
//! 提供检测结果数据结构和健康检测编排器

pub mod orchestrator;
pub mod result;

// 重新导出主要类型
pub use orchestrator::{HealthCheck, HealthCheckOptions};
pub use result::{aggregate, CheckState, CheckStatus, HealthReport, ProbeOutcome};
