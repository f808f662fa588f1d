//! 健康检测编排器
//!
//! [`HealthCheck`] 根据配置列表批量创建并启动检测，按严重级别汇总整体健康状态

use crate::check::{Check, CheckRegistry};
use crate::config::{CheckConfig, HealthVitalsConfig};
use crate::error::{ConfigError, Result};
use crate::health::result::{aggregate, CheckStatus, HealthReport};
use crate::logging::{default_logger, CheckLogger};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// 编排器选项
#[derive(Clone)]
pub struct HealthCheckOptions {
    /// 检测配置列表
    pub checks: Vec<CheckConfig>,
    /// 注入到每个检测的日志能力
    pub log: Arc<dyn CheckLogger>,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            checks: Vec::new(),
            log: default_logger(),
        }
    }
}

impl HealthCheckOptions {
    /// 使用检测列表创建，日志使用默认实现
    pub fn new(checks: Vec<CheckConfig>) -> Self {
        Self {
            checks,
            ..Default::default()
        }
    }

    /// 设置日志能力
    pub fn with_logger(mut self, log: Arc<dyn CheckLogger>) -> Self {
        self.log = log;
        self
    }

    /// 追加一个检测配置
    pub fn with_check(mut self, check: CheckConfig) -> Self {
        self.checks.push(check);
        self
    }
}

impl From<HealthVitalsConfig> for HealthCheckOptions {
    fn from(config: HealthVitalsConfig) -> Self {
        Self::new(config.checks)
    }
}

impl fmt::Debug for HealthCheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckOptions")
            .field("checks", &self.checks)
            .finish_non_exhaustive()
    }
}

/// 健康检测集合
pub struct HealthCheck {
    options: HealthCheckOptions,
    registry: CheckRegistry,
    /// 当前持有的检测，每次 `run_all_health_check` 整体替换
    check_objects: RwLock<Vec<Arc<Check>>>,
}

impl HealthCheck {
    /// 创建编排器，使用内置注册表
    pub fn new(options: HealthCheckOptions) -> Result<Self> {
        Ok(Self::with_registry(options, CheckRegistry::new()?))
    }

    /// 使用指定注册表创建编排器
    pub fn with_registry(options: HealthCheckOptions, registry: CheckRegistry) -> Self {
        Self {
            options,
            registry,
            check_objects: RwLock::new(Vec::new()),
        }
    }

    /// 编排器选项
    pub fn options(&self) -> &HealthCheckOptions {
        &self.options
    }

    /// 根据配置创建全部检测但不启动
    ///
    /// 任一配置无效时整体失败，不返回部分结果。
    pub fn build_checks(&self) -> std::result::Result<Vec<Arc<Check>>, ConfigError> {
        self.options
            .checks
            .iter()
            .map(|options| {
                self.registry
                    .build(options, Arc::clone(&self.options.log))
                    .map(Arc::new)
            })
            .collect()
    }

    /// 重新创建并启动全部检测
    ///
    /// 先完成所有检测的构造，再并发启动；构造失败时不启动任何检测，
    /// 已持有的检测保持不变。成功后替换并停止旧的检测集合。
    pub async fn run_all_health_check(&self) -> Result<()> {
        let checks = self.build_checks()?;

        let started = futures::future::join_all(checks.iter().map(|check| check.start())).await;
        if let Some(err) = started.into_iter().find_map(|r| r.err()) {
            checks.iter().for_each(|check| check.stop());
            return Err(err.into());
        }

        let previous = {
            let mut guard = self
                .check_objects
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, checks)
        };
        for check in previous.iter().filter(|check| check.is_running()) {
            check.stop();
        }

        info!("已启动 {} 个健康检测", self.options.checks.len());
        Ok(())
    }

    /// 重新执行全部检测并返回汇总结果
    ///
    /// 只有严重级别为 1 的检测参与汇总，全部健康时返回 true。
    pub async fn status(&self) -> Result<bool> {
        self.run_all_health_check().await?;
        let ok = aggregate(&self.to_json());
        debug!("汇总健康状态: {}", ok);
        Ok(ok)
    }

    /// 停止所有运行中的检测
    pub fn stop(&self) {
        for check in self.check_objects().iter().filter(|check| check.is_running()) {
            check.stop();
        }
    }

    /// 当前持有的检测
    pub fn check_objects(&self) -> Vec<Arc<Check>> {
        self.check_objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 各检测的状态快照
    pub fn to_json(&self) -> Vec<CheckStatus> {
        self.check_objects()
            .iter()
            .map(|check| check.to_json())
            .collect()
    }

    /// 读取当前状态生成汇总报告，不会重新执行检测
    pub fn report(&self) -> HealthReport {
        HealthReport::from_checks(self.to_json())
    }

    /// 多行可读摘要
    pub fn inspect(&self) -> String {
        let mut lines = vec!["HealthCheck {".to_string()];
        lines.extend(
            self.check_objects()
                .iter()
                .map(|check| format!("  {}", check.inspect())),
        );
        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("check_objects", &self.check_objects())
            .finish()
    }
}
