//! HTTP传输层
//!
//! 定义探测使用的传输能力 [`Transport`]，并提供基于 reqwest 的默认实现

use crate::error::{HealthVitalsError, TransportError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

/// 单次探测请求
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// HTTP方法
    pub method: Method,
    /// 请求地址
    pub url: String,
    /// 请求头
    pub headers: HeaderMap,
    /// 单次尝试的超时时间
    pub timeout: Duration,
    /// 可重试失败的最大重试次数
    pub retries: u32,
}

/// 传输能力trait
///
/// 响应为 2xx 时返回成功，否则返回携带可读原因的 [`TransportError`]。
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求，内部处理超时与重试
    async fn send(&self, request: ProbeRequest) -> Result<(), TransportError>;
}

/// 单次尝试的失败信息
struct AttemptFailure {
    retryable: bool,
    error: TransportError,
}

/// 基于 reqwest 的传输实现
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 创建新的传输实例
    pub fn new() -> Result<Self, HealthVitalsError> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| HealthVitalsError::Other(anyhow::anyhow!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }

    /// 使用已有客户端创建
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// 执行单次请求
    async fn attempt(&self, request: &ProbeRequest) -> Result<(), AttemptFailure> {
        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| AttemptFailure {
                retryable: e.is_timeout() || e.is_connect(),
                error: TransportError::new(format_request_error(&e, request.timeout)),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AttemptFailure {
                retryable: is_retryable_status(status),
                error: TransportError::new(format_status(status)),
            })
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ProbeRequest) -> Result<(), TransportError> {
        let mut attempt = 0;

        loop {
            match self.attempt(&request).await {
                Ok(()) => return Ok(()),
                Err(failure) if failure.retryable && attempt < request.retries => {
                    attempt += 1;
                    debug!(
                        "请求失败，开始第 {} 次重试: {} {} - {}",
                        attempt, request.method, request.url, failure.error
                    );
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// 服务端错误、请求超时和限流属于可重试的响应
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// 格式化非 2xx 响应
fn format_status(status: StatusCode) -> String {
    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

/// 格式化请求错误信息，使其更加清晰易读
fn format_request_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("Timeout of {}ms exceeded", timeout.as_millis())
    } else if error.is_connect() {
        format!("Connection failed: {}", error_chain(error))
    } else if error.is_builder() {
        format!("Invalid request: {error}")
    } else if let Some(status) = error.status() {
        format_status(status)
    } else {
        format!("Request failed: {error}")
    }
}

/// 拼接错误及其来源链，保留 DNS、TLS 等底层原因
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
