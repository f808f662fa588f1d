//! HTTP URL 探测
//!
//! 请求配置的URL，2xx 视为健康。请求默认携带禁用缓存的请求头，
//! 用户配置的同名请求头优先。

use crate::check::probe::Probe;
use crate::check::transport::{ProbeRequest, Transport};
use crate::config::{CheckConfig, UrlSource};
use crate::error::ConfigError;
use crate::health::ProbeOutcome;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// 默认重试次数
pub const DEFAULT_RETRY: u32 = 2;

/// 默认禁用缓存的请求头
pub const CACHE_BUSTING_HEADERS: [(&str, &str); 3] = [
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// HTTP URL 探测策略
pub struct HttpUrlProbe {
    url: UrlSource,
    method: Method,
    headers: HeaderMap,
    timeout: Duration,
    retries: u32,
    transport: Arc<dyn Transport>,
}

impl HttpUrlProbe {
    /// 注册表中使用的类型名
    pub const TYPE: &'static str = "http";

    /// 创建HTTP探测
    ///
    /// # 参数
    /// * `options` - 检测配置
    /// * `transport` - 传输实现
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - `url`、`headers` 或 `method` 不合法时返回选项错误
    pub fn new(options: &CheckConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Self::assert_option_validity(options)?;

        let url = options
            .url
            .clone()
            .ok_or_else(|| ConfigError::invalid_option(INVALID_URL))?;

        Ok(Self {
            url,
            method: parse_method(options.method.as_deref())?,
            headers: merge_headers(options.headers.as_ref())?,
            timeout: options.interval,
            retries: options.retry.unwrap_or(DEFAULT_RETRY),
            transport,
        })
    }

    /// 校验HTTP相关配置，无副作用
    pub fn validate_options(options: &CheckConfig) -> Result<(), ConfigError> {
        match &options.url {
            Some(UrlSource::Literal(url)) if !url.trim().is_empty() => {}
            Some(UrlSource::Dynamic(_)) => {}
            _ => return Err(ConfigError::invalid_option(INVALID_URL)),
        }
        merge_headers(options.headers.as_ref())?;
        parse_method(options.method.as_deref())?;
        Ok(())
    }

    /// 断言配置合法
    pub fn assert_option_validity(options: &CheckConfig) -> Result<(), ConfigError> {
        Self::validate_options(options)
    }

    /// 构建本次探测的请求，动态URL在此处解析一次
    pub fn build_request(&self) -> ProbeRequest {
        ProbeRequest {
            method: self.method.clone(),
            url: self.url.resolve(),
            headers: self.headers.clone(),
            timeout: self.timeout,
            retries: self.retries,
        }
    }
}

const INVALID_URL: &str = "url must be a non-empty string or a function";

#[async_trait]
impl Probe for HttpUrlProbe {
    fn kind(&self) -> &'static str {
        Self::TYPE
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.transport.send(self.build_request()).await {
            Ok(()) => ProbeOutcome::success(),
            Err(e) => ProbeOutcome::failure(e.message),
        }
    }
}

/// 解析HTTP方法，默认 GET
fn parse_method(method: Option<&str>) -> Result<Method, ConfigError> {
    match method {
        None => Ok(Method::GET),
        Some(method) => Method::from_str(&method.trim().to_uppercase()).map_err(|_| {
            ConfigError::invalid_option(format!("method is not a valid HTTP method: {method}"))
        }),
    }
}

/// 合并默认请求头与用户请求头，键名不区分大小写，用户值覆盖默认值
///
/// 用户请求头必须是字符串到字符串的映射。
pub fn merge_headers(user: Option<&serde_json::Value>) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    for (name, value) in CACHE_BUSTING_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    let Some(user) = user else {
        return Ok(headers);
    };
    let map = user
        .as_object()
        .ok_or_else(|| ConfigError::invalid_option("headers must be an object"))?;

    for (key, value) in map {
        let value = value.as_str().ok_or_else(|| {
            ConfigError::invalid_option(format!("headers.{key} must be a string"))
        })?;
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            ConfigError::invalid_option(format!("headers contains an invalid name: {key}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ConfigError::invalid_option(format!("headers.{key} contains an invalid value"))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}
