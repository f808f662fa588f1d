//! 错误处理模块
//!
//! 定义应用程序的统一错误类型。
//! 配置错误在构造阶段同步返回，探测失败只作为检测结果记录，不会作为错误抛出。

use thiserror::Error;

/// Health Vitals 的主要错误类型
#[derive(Error, Debug)]
pub enum HealthVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 检测生命周期错误
    #[error("检测错误: {0}")]
    Check(#[from] CheckError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 检测类型未在注册表中登记
    #[error("Invalid check type: {check_type}")]
    InvalidCheckType { check_type: String },

    /// 检测选项类型不匹配或缺失
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

impl ConfigError {
    /// 构造选项错误
    pub fn invalid_option(message: impl Into<String>) -> Self {
        ConfigError::InvalidOption(message.into())
    }

    /// 是否为类型不匹配类错误（未知检测类型或非法选项）
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidCheckType { .. } | ConfigError::InvalidOption(_)
        )
    }
}

/// 检测生命周期错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// 对运行中的检测再次调用 start
    #[error("检测已在运行中: {name}")]
    AlreadyRunning { name: String },
}

/// 传输层错误，携带可读的失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// 失败原因
    pub message: String,
}

impl TransportError {
    /// 创建传输错误
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HealthVitalsError>;
