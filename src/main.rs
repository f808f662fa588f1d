//! Health Vitals 主程序入口
//!
//! 健康检测编排工具

use anyhow::{Context, Result};
use clap::Parser;
use health_vitals::cli::{Args, Command, Commands, StatusCommand, ValidateCommand, WatchCommand};
use health_vitals::config::{ConfigLoader, TomlConfigLoader};
use health_vitals::logging::LoggingSystem;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 先加载配置，日志级别可能来自配置文件
    let config_path = args.get_config_path();
    let config = TomlConfigLoader::new(true)
        .load_from_file(&config_path)
        .await
        .with_context(|| format!("加载配置文件失败: {}", config_path.display()))?;

    let log_config = args.log_config(&config);
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Health Vitals v{} 启动", health_vitals::VERSION);

    let command: Box<dyn Command> = match &args.command {
        Commands::Status { format } => Box::new(StatusCommand {
            format: format.clone(),
        }),
        Commands::Validate => Box::new(ValidateCommand),
        Commands::Watch { report_interval } => Box::new(WatchCommand {
            report_interval: Duration::from_secs((*report_interval).max(1)),
        }),
    };

    match command.execute(config).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("命令执行失败: {}", e);
            std::process::exit(2);
        }
    }
}
