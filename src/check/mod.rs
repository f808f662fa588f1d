//! 检测模块
//!
//! 提供检测的生命周期管理、探测策略接口、HTTP探测实现和类型注册表

pub mod base;
pub mod http;
pub mod probe;
pub mod registry;
pub mod transport;

// 重新导出主要类型
pub use base::Check;
pub use http::HttpUrlProbe;
pub use probe::Probe;
pub use registry::{CheckRegistry, ProbeFactory};
pub use transport::{ProbeRequest, ReqwestTransport, Transport};
