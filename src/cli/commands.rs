//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::OutputFormat;
use crate::config::HealthVitalsConfig;
use crate::error::Result;
use crate::health::{HealthCheck, HealthCheckOptions, HealthReport};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    ///
    /// # 返回
    /// * `Result<bool>` - 命令是否成功（用于决定进程退出码）
    async fn execute(&self, config: HealthVitalsConfig) -> Result<bool>;
}

/// 一次性状态检测命令
pub struct StatusCommand {
    /// 输出格式
    pub format: OutputFormat,
}

#[async_trait]
impl Command for StatusCommand {
    async fn execute(&self, config: HealthVitalsConfig) -> Result<bool> {
        let health_check = HealthCheck::new(HealthCheckOptions::from(config))?;

        let ok = health_check.status().await?;
        let report = health_check.report();
        health_check.stop();

        match self.format {
            OutputFormat::Json => println!("{}", report.to_json()?),
            OutputFormat::Text => print!("{}", render_text_report(&report)),
        }

        Ok(ok)
    }
}

/// 配置验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, config: HealthVitalsConfig) -> Result<bool> {
        let count = config.checks.len();
        let health_check = HealthCheck::new(HealthCheckOptions::from(config))?;

        // 只构造不启动
        health_check.build_checks()?;

        println!("✓ 配置有效，共 {count} 个检测");
        Ok(true)
    }
}

/// 持续运行命令
pub struct WatchCommand {
    /// 汇总报告输出间隔
    pub report_interval: Duration,
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, config: HealthVitalsConfig) -> Result<bool> {
        let health_check = HealthCheck::new(HealthCheckOptions::from(config))?;
        health_check.run_all_health_check().await?;

        let mut ticker = tokio::time::interval(self.report_interval);
        // 首次 tick 立即返回，跳过
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = health_check.report();
                    let failing: Vec<&str> = report
                        .checks
                        .iter()
                        .filter(|check| !check.ok)
                        .map(|check| check.name.as_str())
                        .collect();
                    info!(
                        "汇总健康状态: {}，异常检测: {:?}",
                        if report.ok { "正常" } else { "异常" },
                        failing
                    );
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("收到停止信号，停止全部检测");
                    break;
                }
            }
        }

        health_check.stop();
        Ok(health_check.report().ok)
    }
}

/// 渲染文本格式的报告
pub fn render_text_report(report: &HealthReport) -> String {
    let mut output = String::new();
    for check in &report.checks {
        output.push_str(&format!(
            "[{}] {} (severity {}): {}\n",
            if check.ok { " OK " } else { "FAIL" },
            check.name,
            check.severity,
            check.check_output
        ));
    }
    output.push_str(&format!(
        "overall: {}\n",
        if report.ok { "healthy" } else { "unhealthy" }
    ));
    output
}
