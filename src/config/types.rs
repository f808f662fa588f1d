//! 配置数据结构定义
//!
//! 定义检测配置、URL来源以及配置文件的整体结构

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 配置文件结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthVitalsConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志文件路径，设置后日志写入该文件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// 模块级别日志控制，如 `reqwest = "warn"`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub log_modules: HashMap<String, String>,
    /// 检测配置列表
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

/// 检测的URL来源
///
/// 固定地址直接使用；动态来源在每次检测开始时调用一次，用于轮换目标。
#[derive(Clone)]
pub enum UrlSource {
    /// 固定URL
    Literal(String),
    /// 每次检测时计算的URL
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl UrlSource {
    /// 由闭包创建动态来源
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        UrlSource::Dynamic(Arc::new(resolver))
    }

    /// 解析出本次检测要使用的URL
    pub fn resolve(&self) -> String {
        match self {
            UrlSource::Literal(url) => url.clone(),
            UrlSource::Dynamic(resolver) => resolver(),
        }
    }

    /// 是否为动态来源
    pub fn is_dynamic(&self) -> bool {
        matches!(self, UrlSource::Dynamic(_))
    }
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Literal(url) => f.debug_tuple("Literal").field(url).finish(),
            UrlSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Literal(url) => f.write_str(url),
            UrlSource::Dynamic(_) => f.write_str("<dynamic>"),
        }
    }
}

impl PartialEq for UrlSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UrlSource::Literal(a), UrlSource::Literal(b)) => a == b,
            (UrlSource::Dynamic(a), UrlSource::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for UrlSource {
    fn from(url: &str) -> Self {
        UrlSource::Literal(url.to_string())
    }
}

impl From<String> for UrlSource {
    fn from(url: String) -> Self {
        UrlSource::Literal(url)
    }
}

impl Serialize for UrlSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UrlSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(UrlSource::Literal)
    }
}

/// 单个检测的配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckConfig {
    /// 检测类型，需要在注册表中存在
    #[serde(rename = "type")]
    pub check_type: String,
    /// 检测名称
    pub name: String,
    /// 检测间隔，同时作为单次请求的超时时间（毫秒）
    #[serde(default = "default_interval", with = "duration_ms")]
    pub interval: Duration,
    /// 严重级别，1 为阻断级别
    pub severity: u8,
    /// 自动重试次数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u32>,
    /// HTTP方法
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 检测目标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlSource>,
    /// 自定义请求头，必须是字符串到字符串的映射
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Value>,
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

impl CheckConfig {
    /// 创建检测配置，严重级别默认 1，间隔默认 30 秒
    pub fn new(check_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            check_type: check_type.into(),
            name: name.into(),
            interval: default_interval(),
            severity: 1,
            retry: None,
            method: None,
            url: None,
            headers: None,
            panic_guide: None,
            business_impact: None,
            technical_summary: None,
        }
    }

    /// 创建HTTP检测配置
    pub fn http(name: impl Into<String>, url: impl Into<UrlSource>) -> Self {
        Self::new("http", name).with_url(url)
    }

    /// 设置URL
    pub fn with_url(mut self, url: impl Into<UrlSource>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 设置检测间隔
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 设置严重级别
    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = severity;
        self
    }

    /// 设置重试次数
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    /// 设置HTTP方法
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// 添加单个请求头
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self
            .headers
            .get_or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(map) = headers {
            map.insert(key.into(), serde_json::Value::String(value.into()));
        }
        self
    }

    /// 设置原始请求头值（不做校验，由检测构造时校验）
    pub fn with_headers(mut self, headers: serde_json::Value) -> Self {
        self.headers = Some(headers);
        self
    }

    /// 设置故障处理指引
    pub fn with_panic_guide(mut self, panic_guide: impl Into<String>) -> Self {
        self.panic_guide = Some(panic_guide.into());
        self
    }

    /// 设置业务影响描述
    pub fn with_business_impact(mut self, business_impact: impl Into<String>) -> Self {
        self.business_impact = Some(business_impact.into());
        self
    }

    /// 设置技术摘要
    pub fn with_technical_summary(mut self, technical_summary: impl Into<String>) -> Self {
        self.technical_summary = Some(technical_summary.into());
        self
    }
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(30)
}

/// 配置文件验证
///
/// 只校验文件层面的约束，单个检测的选项由检测构造时校验。
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &HealthVitalsConfig) -> Result<(), String> {
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    for (module, level) in &config.log_modules {
        if !valid_log_levels.contains(&level.as_str()) {
            return Err(format!("模块 {} 的日志级别无效: {}", module, level));
        }
    }

    if config.checks.is_empty() {
        return Err("至少需要配置一个检测".to_string());
    }

    let mut names = HashSet::new();
    for check in &config.checks {
        if check.name.trim().is_empty() {
            return Err("检测名称不能为空".to_string());
        }
        if !names.insert(check.name.as_str()) {
            return Err(format!("检测名称重复: {}", check.name));
        }
        if check.interval.is_zero() {
            return Err(format!("检测 {} 的间隔不能为0", check.name));
        }
    }

    Ok(())
}

/// Duration 以毫秒序列化
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_config() -> HealthVitalsConfig {
        HealthVitalsConfig {
            log_level: "info".to_string(),
            log_file: None,
            log_modules: HashMap::new(),
            checks: vec![CheckConfig::http("api", "https://example.test/health")],
        }
    }

    #[test]
    fn test_check_config_from_toml() {
        let content = r#"
type = "http"
name = "api"
url = "https://example.test/health"
interval = 5000
severity = 2
retry = 0

[headers]
pragma = "custom"
"#;
        let config: CheckConfig = toml::from_str(content).unwrap();
        assert_eq!(config.check_type, "http");
        assert_eq!(config.interval, Duration::from_millis(5000));
        assert_eq!(config.severity, 2);
        assert_eq!(config.retry, Some(0));
        assert_eq!(
            config.url,
            Some(UrlSource::Literal("https://example.test/health".to_string()))
        );
        assert_eq!(config.headers.unwrap()["pragma"], "custom");
    }

    #[test]
    fn test_interval_defaults_when_missing() {
        let config: CheckConfig =
            toml::from_str("type = \"http\"\nname = \"api\"\nseverity = 1\n").unwrap();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert!(config.url.is_none());
    }

    #[test]
    fn test_dynamic_url_is_resolved_on_each_call() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let source = UrlSource::dynamic(move || {
            let n = counter_clone.fetch_add(1, Ordering::SeqCst);
            format!("https://node-{n}.example.test/health")
        });

        assert!(source.is_dynamic());
        assert_eq!(source.resolve(), "https://node-0.example.test/health");
        assert_eq!(source.resolve(), "https://node-1.example.test/health");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_with_header_builds_object() {
        let config = CheckConfig::http("api", "https://example.test")
            .with_header("x-token", "abc")
            .with_header("pragma", "custom");
        let headers = config.headers.unwrap();
        assert_eq!(headers["x-token"], "abc");
        assert_eq!(headers["pragma"], "custom");
    }

    #[test]
    fn test_validate_config() {
        let config = create_test_config();
        assert!(validate_config(&config).is_ok());

        let mut empty = config.clone();
        empty.checks.clear();
        assert!(validate_config(&empty).is_err());

        let mut duplicated = config.clone();
        duplicated.checks.push(duplicated.checks[0].clone());
        assert!(validate_config(&duplicated)
            .unwrap_err()
            .contains("检测名称重复"));

        let mut bad_level = config.clone();
        bad_level.log_level = "loud".to_string();
        assert!(validate_config(&bad_level).is_err());

        let mut bad_module_level = config.clone();
        bad_module_level
            .log_modules
            .insert("reqwest".to_string(), "loud".to_string());
        assert!(validate_config(&bad_module_level)
            .unwrap_err()
            .contains("reqwest"));

        let mut zero_interval = config;
        zero_interval.checks[0].interval = Duration::ZERO;
        assert!(validate_config(&zero_interval).is_err());
    }

    #[test]
    fn test_log_settings_from_toml() {
        let content = r#"
log_level = "debug"
log_file = "/var/log/health-vitals.log"

[log_modules]
reqwest = "warn"

[[checks]]
type = "http"
name = "api"
url = "https://example.test/health"
severity = 1
"#;
        let config: HealthVitalsConfig = toml::from_str(content).unwrap();
        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/var/log/health-vitals.log"))
        );
        assert_eq!(config.log_modules["reqwest"], "warn");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_interval_serialization_saturates() {
        let config = CheckConfig::http("api", "https://example.test").with_interval(Duration::MAX);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["interval"], u64::MAX);

        let config = config.with_interval(Duration::from_millis(1500));
        assert_eq!(serde_json::to_value(&config).unwrap()["interval"], 1500);
    }
}
