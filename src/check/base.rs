//! 检测基础实现
//!
//! [`Check`] 负责配置校验、定时调度、结果记录和状态快照，
//! 具体的探测逻辑由注入的 [`Probe`] 策略完成。

use crate::check::probe::Probe;
use crate::config::CheckConfig;
use crate::error::{CheckError, ConfigError};
use crate::health::{CheckState, CheckStatus, ProbeOutcome};
use crate::logging::CheckLogger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// 允许的严重级别范围
pub const SEVERITY_RANGE: std::ops::RangeInclusive<u8> = 1..=3;

/// 检测共享部分，定时任务与检测本身共同持有
struct CheckInner {
    /// 构造后不可变的配置
    options: CheckConfig,
    /// 探测策略
    probe: Arc<dyn Probe>,
    /// 最近一次检测状态
    state: RwLock<CheckState>,
    /// 日志能力
    log: Arc<dyn CheckLogger>,
}

impl CheckInner {
    /// 执行一次探测并整体写入状态
    async fn run(&self) {
        let outcome = self.probe.probe().await;
        self.apply(outcome);
    }

    fn apply(&self, outcome: ProbeOutcome) {
        let name = &self.options.name;
        if outcome.ok {
            self.log.info(&format!("Health check \"{name}\" succeeded"));
        } else {
            self.log
                .error(&format!("Health check \"{name}\" failed: {}", outcome.output));
        }

        // 重叠执行时以最后写入者为准
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = CheckState::from(outcome);
    }

    fn state(&self) -> CheckState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// 单个独立调度的健康检测
pub struct Check {
    inner: Arc<CheckInner>,
    /// 定时任务句柄，仅由检测自身持有
    timer: Mutex<Option<JoinHandle<()>>>,
    /// 是否处于运行状态
    running: AtomicBool,
}

impl Check {
    /// 创建检测
    ///
    /// # 参数
    /// * `options` - 检测配置
    /// * `probe` - 已完成校验的探测策略
    /// * `log` - 日志能力
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 配置不合法时返回选项错误
    pub fn new(
        options: CheckConfig,
        probe: Arc<dyn Probe>,
        log: Arc<dyn CheckLogger>,
    ) -> Result<Self, ConfigError> {
        Self::assert_option_validity(&options)?;

        Ok(Self {
            inner: Arc::new(CheckInner {
                options,
                probe,
                state: RwLock::new(CheckState::default()),
                log,
            }),
            timer: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// 校验基础配置，无副作用
    pub fn validate_options(options: &CheckConfig) -> Result<(), ConfigError> {
        if options.name.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "name must be a non-empty string",
            ));
        }
        if !SEVERITY_RANGE.contains(&options.severity) {
            return Err(ConfigError::invalid_option(format!(
                "severity must be between {} and {}, got {}",
                SEVERITY_RANGE.start(),
                SEVERITY_RANGE.end(),
                options.severity
            )));
        }
        if options.interval.is_zero() {
            return Err(ConfigError::invalid_option(
                "interval must be greater than zero",
            ));
        }
        Ok(())
    }

    /// 断言配置合法，构造时调用
    pub fn assert_option_validity(options: &CheckConfig) -> Result<(), ConfigError> {
        Self::validate_options(options).inspect_err(|e| {
            warn!("检测配置无效 {}: {}", options.name, e);
        })
    }

    /// 启动检测
    ///
    /// 先安排周期任务（首次触发在一个间隔之后），再立即执行一次检测并等待其完成。
    /// 前置条件：检测不能处于运行状态。
    pub async fn start(&self) -> Result<(), CheckError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CheckError::AlreadyRunning {
                name: self.inner.options.name.clone(),
            });
        }

        let inner = Arc::clone(&self.inner);
        let period = inner.options.interval;
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // 每次执行单独成任务，停止定时器不会打断进行中的检测
                let inner = Arc::clone(&inner);
                tokio::spawn(async move { inner.run().await });
            }
        });

        if let Some(previous) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task)
        {
            previous.abort();
        }

        debug!("启动检测任务: {}", self.inner.options.name);
        self.inner.run().await;
        Ok(())
    }

    /// 停止周期调度，未运行时为空操作
    pub fn stop(&self) {
        if let Some(task) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }

        if self.running.swap(false, Ordering::SeqCst) {
            debug!("停止检测任务: {}", self.inner.options.name);
        }
    }

    /// 是否处于运行状态
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 立即执行一次检测
    pub async fn run(&self) {
        self.inner.run().await;
    }

    /// 检测名称
    pub fn name(&self) -> &str {
        &self.inner.options.name
    }

    /// 严重级别
    pub fn severity(&self) -> u8 {
        self.inner.options.severity
    }

    /// 检测配置
    pub fn options(&self) -> &CheckConfig {
        &self.inner.options
    }

    /// 探测类型
    pub fn kind(&self) -> &'static str {
        self.inner.probe.kind()
    }

    /// 当前状态的副本
    pub fn state(&self) -> CheckState {
        self.inner.state()
    }

    /// 状态快照，修改返回值不会影响检测本身
    pub fn to_json(&self) -> CheckStatus {
        let state = self.inner.state();
        let options = &self.inner.options;

        CheckStatus {
            name: options.name.clone(),
            ok: state.ok,
            severity: options.severity,
            check_output: state.check_output,
            last_updated: state.last_updated,
            panic_guide: options.panic_guide.clone(),
            business_impact: options.business_impact.clone(),
            technical_summary: options.technical_summary.clone(),
        }
    }

    /// 单行可读摘要
    pub fn inspect(&self) -> String {
        let state = self.inner.state();
        format!(
            "Check<{}> \"{}\" {} severity={} output={:?} last_updated={}",
            self.kind(),
            self.name(),
            if state.ok { "OK" } else { "FAILING" },
            self.severity(),
            state.check_output,
            state
                .last_updated
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        )
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.inner.options.name)
            .field("kind", &self.kind())
            .field("running", &self.is_running())
            .field("state", &self.inner.state())
            .finish()
    }
}

impl Drop for Check {
    fn drop(&mut self) {
        if let Some(task) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// 按顺序返回预设结果的探测
    struct ScriptedProbe {
        calls: AtomicUsize,
        healthy: AtomicBool,
    }

    impl ScriptedProbe {
        fn new(healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                healthy: AtomicBool::new(healthy),
            })
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        fn kind(&self) -> &'static str {
            "scripted"
        }

        async fn probe(&self) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                ProbeOutcome::success()
            } else {
                ProbeOutcome::failure("scripted failure")
            }
        }
    }

    /// 首次立即成功，之后每次探测都要 80ms 才返回失败
    struct SlowProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Probe for SlowProbe {
        fn kind(&self) -> &'static str {
            "slow"
        }

        async fn probe(&self) -> ProbeOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                return ProbeOutcome::success();
            }
            tokio::time::sleep(Duration::from_millis(80)).await;
            ProbeOutcome::failure(format!("late-{call}"))
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl CheckLogger for RecordingLogger {
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(format!("INFO {message}"));
        }

        fn error(&self, message: &str) {
            self.lines.lock().unwrap().push(format!("ERROR {message}"));
        }
    }

    fn create_test_options() -> CheckConfig {
        CheckConfig::new("scripted", "database")
            .with_interval(Duration::from_millis(50))
            .with_severity(1)
    }

    #[test]
    fn test_validate_options() {
        assert!(Check::validate_options(&create_test_options()).is_ok());

        let unnamed = CheckConfig::new("scripted", "  ");
        assert!(Check::validate_options(&unnamed).is_err());

        let bad_severity = create_test_options().with_severity(0);
        assert!(matches!(
            Check::validate_options(&bad_severity),
            Err(ConfigError::InvalidOption(_))
        ));

        let zero_interval = create_test_options().with_interval(Duration::ZERO);
        assert!(Check::validate_options(&zero_interval).is_err());
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let result = Check::new(
            create_test_options().with_severity(9),
            ScriptedProbe::new(true),
            Arc::new(RecordingLogger::default()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_start_runs_immediately() {
        let probe = ScriptedProbe::new(true);
        let logger = Arc::new(RecordingLogger::default());
        let check = Check::new(create_test_options(), probe.clone(), logger.clone()).unwrap();

        assert!(!check.is_running());
        assert!(check.to_json().last_updated.is_none());

        check.start().await.unwrap();

        assert!(check.is_running());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        let status = check.to_json();
        assert!(status.ok);
        assert_eq!(status.check_output, "success");
        assert!(status.last_updated.is_some());
        assert_eq!(
            logger.lines.lock().unwrap()[0],
            "INFO Health check \"database\" succeeded"
        );

        check.stop();
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_raised() {
        let logger = Arc::new(RecordingLogger::default());
        let check =
            Check::new(create_test_options(), ScriptedProbe::new(false), logger.clone()).unwrap();

        check.run().await;

        let status = check.to_json();
        assert!(!status.ok);
        assert_eq!(status.check_output, "scripted failure");
        assert_eq!(
            logger.lines.lock().unwrap()[0],
            "ERROR Health check \"database\" failed: scripted failure"
        );
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let check = Check::new(
            create_test_options(),
            ScriptedProbe::new(true),
            Arc::new(RecordingLogger::default()),
        )
        .unwrap();

        check.start().await.unwrap();
        assert_eq!(
            check.start().await,
            Err(CheckError::AlreadyRunning {
                name: "database".to_string()
            })
        );
        check.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_recurring_runs_and_stop() {
        let probe = ScriptedProbe::new(true);
        let check = Check::new(
            create_test_options(),
            probe.clone(),
            Arc::new(RecordingLogger::default()),
        )
        .unwrap();

        check.start().await.unwrap();
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);

        check.stop();
        assert!(!check.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);

        // 未运行时再次停止为空操作
        check.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_run_finish() {
        let probe = Arc::new(SlowProbe {
            calls: AtomicUsize::new(0),
        });
        let logger = Arc::new(RecordingLogger::default());
        let check = Check::new(create_test_options(), probe.clone(), logger.clone()).unwrap();

        check.start().await.unwrap();
        let before = check.to_json();
        assert_eq!(before.check_output, "success");

        // 第一次定时触发在 50ms，探测需要到 130ms 才结束
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        check.stop();
        assert_eq!(check.to_json(), before);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let after = check.to_json();
        assert!(!after.ok);
        assert_eq!(after.check_output, "late-1");
        assert!(after.last_updated.is_some());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            logger.lines.lock().unwrap().last().unwrap(),
            "ERROR Health check \"database\" failed: late-1"
        );
    }

    #[tokio::test]
    async fn test_to_json_is_a_snapshot() {
        let check = Check::new(
            create_test_options().with_panic_guide("restart the pool"),
            ScriptedProbe::new(true),
            Arc::new(RecordingLogger::default()),
        )
        .unwrap();
        check.run().await;

        let first = check.to_json();
        let mut mutated = check.to_json();
        mutated.ok = false;
        mutated.check_output = "changed".to_string();

        assert_eq!(first, check.to_json());
        assert_eq!(first.panic_guide.as_deref(), Some("restart the pool"));
    }

    #[tokio::test]
    async fn test_inspect_is_single_line() {
        let check = Check::new(
            create_test_options(),
            ScriptedProbe::new(false),
            Arc::new(RecordingLogger::default()),
        )
        .unwrap();
        assert!(check.inspect().contains("never"));

        check.run().await;
        let line = check.inspect();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("Check<scripted> \"database\" FAILING"));
    }
}
