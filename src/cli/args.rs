//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::HealthVitalsConfig;
use crate::logging::LogConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Health Vitals - 健康检测编排工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "health-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "HEALTH_VITALS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "HEALTH_VITALS_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志", global = true)]
    pub json_logs: bool,

    /// 日志文件路径，覆盖配置文件中的 `log_file`
    #[arg(long, value_name = "FILE", help = "日志文件路径", global = true)]
    pub log_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次全部检测并输出汇总结果，不健康时退出码为 1
    Status {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 验证配置文件并构造全部检测（不执行）
    Validate,

    /// 启动全部检测并持续运行，Ctrl-C 停止
    Watch {
        /// 汇总报告输出间隔（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            default_value = "30",
            help = "汇总报告输出间隔（秒）"
        )]
        report_interval: u64,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }

    /// 合并配置文件与命令行的日志设置，命令行优先
    pub fn log_config(&self, config: &HealthVitalsConfig) -> LogConfig {
        let mut log_config = LogConfig::from_config(config);
        if let Some(level) = self.log_level.clone() {
            log_config.level = level.into();
        }
        if let Some(path) = &self.log_file {
            log_config.file_path = Some(path.clone());
        }
        log_config.json_format = self.json_logs;
        log_config
    }
}
