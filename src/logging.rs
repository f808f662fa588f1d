//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能，以及注入到各个检测中的日志能力 [`CheckLogger`]

use crate::config::HealthVitalsConfig;
use log::LevelFilter;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt as tracing_fmt, prelude::*, registry, EnvFilter, Layer, Registry,
};

/// 检测日志能力
///
/// 编排器在构造每个检测时注入同一个实例，检测只读共享，不做任何修改。
pub trait CheckLogger: Send + Sync {
    /// 记录信息级别日志
    fn info(&self, message: &str);

    /// 记录错误级别日志
    fn error(&self, message: &str);
}

/// 基于 tracing 的默认日志实现
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CheckLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "health_vitals::check", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "health_vitals::check", "{}", message);
    }
}

/// 默认日志实例
pub fn default_logger() -> Arc<dyn CheckLogger> {
    Arc::new(TracingLogger)
}

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选，设置后输出到文件）
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// 根据配置文件中的日志设置创建
    ///
    /// 无法识别的级别回退为 info，配置文件加载时已做过校验。
    pub fn from_config(config: &HealthVitalsConfig) -> Self {
        Self {
            level: parse_level(&config.log_level).unwrap_or(LevelFilter::Info),
            file_path: config.log_file.clone(),
            json_format: false,
            module_levels: config
                .log_modules
                .iter()
                .filter_map(|(module, level)| Some((module.clone(), parse_level(level)?)))
                .collect(),
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，后续调用直接返回新的实例。
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `anyhow::Result<LoggingSystem>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));
        let mut state = state_mutex.lock().unwrap_or_else(PoisonError::into_inner);

        if !state.initialized {
            Self::init_log_tracer()?;
            Self::init_tracing_subscriber(&config)?;
            state.initialized = true;
            state.current_config = Some(config.clone());
        }

        Ok(Self { config })
    }

    /// 当前实例使用的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = Self::build_env_filter(config)?;

        let result = if let Some(file_path) = &config.file_path {
            let file = Self::create_log_file(file_path)?;
            registry()
                .with(env_filter)
                .with(Self::file_layer::<Layered<EnvFilter, Registry>>(file))
                .try_init()
        } else {
            let fmt_layer = if config.json_format {
                tracing_fmt::layer()
                    .json()
                    .with_timer(tracing_fmt::time::ChronoUtc::rfc_3339())
                    .with_target(true)
                    .boxed()
            } else {
                tracing_fmt::layer()
                    .with_timer(tracing_fmt::time::ChronoUtc::rfc_3339())
                    .with_ansi(true)
                    .with_target(true)
                    .boxed()
            };
            registry().with(env_filter).with(fmt_layer).try_init()
        };

        match result {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already been set")
                    || error_msg.contains("already initialized")
                {
                    // 测试或嵌入场景下全局 subscriber 可能已由宿主设置
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 构建全局级别加模块级别的过滤器
    fn build_env_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        for (module, level) in &config.module_levels {
            let directive = format!("{}={}", module, Self::level_to_string(*level))
                .parse()
                .map_err(|e| anyhow::anyhow!("无效的模块日志级别 {}: {}", module, e))?;
            env_filter = env_filter.add_directive(directive);
        }

        Ok(env_filter)
    }

    /// 创建日志文件，父目录不存在时一并创建
    fn create_log_file(path: &Path) -> anyhow::Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("创建日志目录失败 {}: {}", parent.display(), e))?;
        }
        File::create(path)
            .map_err(|e| anyhow::anyhow!("创建日志文件失败 {}: {}", path.display(), e))
    }

    /// 写入文件的纯文本日志层
    fn file_layer<S>(file: File) -> impl Layer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        tracing_fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_timer(tracing_fmt::time::ChronoUtc::rfc_3339())
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        match level {
            LevelFilter::Off => Directive::from(TracingLevel::OFF),
            LevelFilter::Error => Directive::from(tracing::Level::ERROR),
            LevelFilter::Warn => Directive::from(tracing::Level::WARN),
            LevelFilter::Info => Directive::from(tracing::Level::INFO),
            LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
            LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
        }
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .map(|state| state.lock().unwrap_or_else(PoisonError::into_inner).initialized)
            .unwrap_or(false)
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE.get().and_then(|state| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .current_config
                .clone()
        })
    }
}

/// 将字符串解析为日志级别，无法识别时返回 None
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.parse().ok()
}

impl fmt::Display for LoggingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoggingSystem(level={}, json={})",
            Self::level_to_string(self.config.level),
            self.config.json_format
        )
    }
}
