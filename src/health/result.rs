//! 检测结果数据结构
//!
//! 定义单次探测的结果记录、检测状态快照以及汇总报告

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 成功时写入的检测输出
pub const SUCCESS_OUTPUT: &str = "success";

/// 单次探测的结果
///
/// 探测完成后一次性写入检测状态，不会出现部分更新。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 是否成功
    pub ok: bool,
    /// 可读的结果描述
    pub output: String,
    /// 探测完成时间
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    /// 创建成功结果
    pub fn success() -> Self {
        Self {
            ok: true,
            output: SUCCESS_OUTPUT.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// 创建失败结果
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            output: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// 检测的可变状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckState {
    /// 最近一次检测是否成功
    pub ok: bool,
    /// 最近一次检测的输出
    pub check_output: String,
    /// 最近一次更新时间
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<ProbeOutcome> for CheckState {
    fn from(outcome: ProbeOutcome) -> Self {
        Self {
            ok: outcome.ok,
            check_output: outcome.output,
            last_updated: Some(outcome.timestamp),
        }
    }
}

/// 单个检测的状态快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatus {
    /// 检测名称
    pub name: String,
    /// 是否健康
    pub ok: bool,
    /// 严重级别
    pub severity: u8,
    /// 检测输出
    pub check_output: String,
    /// 最后更新时间
    pub last_updated: Option<DateTime<Utc>>,
    /// 故障处理指引
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panic_guide: Option<String>,
    /// 业务影响
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_impact: Option<String>,
    /// 技术摘要
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_summary: Option<String>,
}

impl CheckStatus {
    /// 是否参与汇总状态计算
    pub fn is_blocking(&self) -> bool {
        self.severity == 1
    }
}

/// 汇总报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// 所有严重级别为 1 的检测是否均健康
    pub ok: bool,
    /// 各检测的状态
    pub checks: Vec<CheckStatus>,
}

impl HealthReport {
    /// 根据检测快照计算汇总结果
    pub fn from_checks(checks: Vec<CheckStatus>) -> Self {
        Self {
            ok: aggregate(&checks),
            checks,
        }
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// 只有严重级别为 1 的检测参与汇总，全部健康时为 true
pub fn aggregate(checks: &[CheckStatus]) -> bool {
    checks
        .iter()
        .filter(|check| check.is_blocking())
        .all(|check| check.ok)
}
