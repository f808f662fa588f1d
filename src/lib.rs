//! Health Vitals - 健康检测编排库
//!
//! 根据声明式的检测配置为每项配置创建独立调度的检测，并提供：
//! - 按严重级别汇总的整体健康状态
//! - 每个检测的结构化状态报告
//! - 可扩展的检测类型注册表（内置 HTTP URL 探测）
//! - 结构化日志记录

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;

// 重新导出主要类型
pub use check::{Check, CheckRegistry, HttpUrlProbe, Probe, Transport};
pub use config::{CheckConfig, HealthVitalsConfig, UrlSource};
pub use error::{CheckError, ConfigError, HealthVitalsError, TransportError};
pub use health::{CheckStatus, HealthCheck, HealthCheckOptions, HealthReport};
pub use logging::{CheckLogger, TracingLogger};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
