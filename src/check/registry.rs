//! 检测类型注册表
//!
//! 将配置中的 `type` 映射到探测工厂，是新增探测类型的唯一扩展点

use crate::check::base::Check;
use crate::check::http::HttpUrlProbe;
use crate::check::probe::Probe;
use crate::check::transport::{ReqwestTransport, Transport};
use crate::config::CheckConfig;
use crate::error::{ConfigError, Result};
use crate::logging::CheckLogger;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 探测工厂：校验配置并创建探测策略
pub type ProbeFactory =
    Arc<dyn Fn(&CheckConfig) -> std::result::Result<Arc<dyn Probe>, ConfigError> + Send + Sync>;

/// 检测类型注册表
#[derive(Clone)]
pub struct CheckRegistry {
    factories: HashMap<String, ProbeFactory>,
}

impl CheckRegistry {
    /// 创建包含内置类型的注册表，HTTP探测使用 reqwest 传输
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    /// 创建空注册表
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 创建包含内置类型的注册表，HTTP探测使用指定传输
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::empty().register(HttpUrlProbe::TYPE, move |options| {
            let probe = HttpUrlProbe::new(options, Arc::clone(&transport))?;
            Ok(Arc::new(probe) as Arc<dyn Probe>)
        })
    }

    /// 注册检测类型，同名类型会被覆盖
    pub fn register<F>(mut self, check_type: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&CheckConfig) -> std::result::Result<Arc<dyn Probe>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(check_type.into(), Arc::new(factory));
        self
    }

    /// 是否包含指定类型
    pub fn contains(&self, check_type: &str) -> bool {
        self.factories.contains_key(check_type)
    }

    /// 已注册的类型（排序后）
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// 根据配置创建检测（不启动）
    ///
    /// 依次校验类型、探测配置和基础配置，任何一步失败都返回类型错误。
    pub fn build(
        &self,
        options: &CheckConfig,
        log: Arc<dyn CheckLogger>,
    ) -> std::result::Result<Check, ConfigError> {
        let factory =
            self.factories
                .get(&options.check_type)
                .ok_or_else(|| ConfigError::InvalidCheckType {
                    check_type: options.check_type.clone(),
                })?;

        let probe = factory(options)?;
        Check::new(options.clone(), probe, log)
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("types", &self.types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::transport::ProbeRequest;
    use crate::error::TransportError;
    use crate::health::ProbeOutcome;
    use crate::logging::TracingLogger;
    use async_trait::async_trait;

    struct NoopTransport;

    #[async_trait]
    impl Transport for NoopTransport {
        async fn send(&self, _request: ProbeRequest) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    struct AlwaysUp;

    #[async_trait]
    impl Probe for AlwaysUp {
        fn kind(&self) -> &'static str {
            "always-up"
        }

        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::success()
        }
    }

    fn create_test_registry() -> CheckRegistry {
        CheckRegistry::with_transport(Arc::new(NoopTransport))
    }

    #[test]
    fn test_builtin_types() {
        let registry = create_test_registry();
        assert!(registry.contains("http"));
        assert_eq!(registry.types(), vec!["http"]);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let registry = create_test_registry();
        let result = registry.build(&CheckConfig::new("unknown", "x"), Arc::new(TracingLogger));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidCheckType {
                check_type: "unknown".to_string()
            }
        );
    }

    #[test]
    fn test_probe_validation_runs_before_construction() {
        let registry = create_test_registry();
        let result = registry.build(&CheckConfig::http("api", ""), Arc::new(TracingLogger));
        assert!(matches!(result, Err(ConfigError::InvalidOption(_))));
    }

    #[tokio::test]
    async fn test_custom_type_registration() {
        let registry = create_test_registry()
            .register("always-up", |_| Ok(Arc::new(AlwaysUp) as Arc<dyn Probe>));
        assert_eq!(registry.types(), vec!["always-up", "http"]);

        let check = registry
            .build(&CheckConfig::new("always-up", "noop"), Arc::new(TracingLogger))
            .unwrap();
        assert_eq!(check.kind(), "always-up");

        check.run().await;
        assert!(check.to_json().ok);
    }
}
