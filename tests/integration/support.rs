//! Scripted gates shared by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gatekeeper::{
    CoreError, CoreResult, EnvironmentDetector, GateDefinition, GateExecutable, GateOrchestrator,
    GateResult,
};

/// What a scripted gate does when executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Pass,
    Fail,
    Error,
    Panic,
}

/// Shared log of gate names in the order they executed.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn execution_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct ScriptedGate {
    pub name: String,
    pub priority: i32,
    pub critical: bool,
    pub behavior: Behavior,
    pub valid: bool,
    pub expected: Duration,
    pub delay: Duration,
    pub metrics: Vec<(String, f64)>,
    pub warnings: Vec<String>,
    pub calls: Arc<AtomicUsize>,
    pub log: ExecutionLog,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedGate {
    pub fn new(name: &str, priority: i32, critical: bool, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            priority,
            critical,
            behavior,
            valid: true,
            expected: Duration::from_secs(5),
            delay: Duration::ZERO,
            metrics: Vec::new(),
            warnings: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            log: execution_log(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn logging_to(mut self, log: &ExecutionLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    pub fn expecting(mut self, expected: Duration) -> Self {
        self.expected = expected;
        self
    }

    pub fn taking(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_metric(mut self, key: &str, value: f64) -> Self {
        self.metrics.push((key.to_string(), value));
        self
    }

    pub fn with_warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    /// Share in-flight counters so overlapping executions can be detected.
    pub fn tracking(mut self, in_flight: &Arc<AtomicUsize>, max: &Arc<AtomicUsize>) -> Self {
        self.in_flight = Arc::clone(in_flight);
        self.max_in_flight = Arc::clone(max);
        self
    }

    fn outcome(&self) -> CoreResult<GateResult> {
        match self.behavior {
            Behavior::Pass => {
                let mut result = GateResult::passed(&self.name, 1);
                for (key, value) in &self.metrics {
                    result = result.with_metric(key.as_str(), *value);
                }
                for warning in &self.warnings {
                    result = result.with_warning(warning.as_str());
                }
                Ok(result)
            }
            Behavior::Fail => Ok(GateResult::failed(&self.name, format!("{} check failed", self.name))),
            Behavior::Error => Err(CoreError::gate_execution(&self.name, "tool not installed")),
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.name.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GateDefinition for ScriptedGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted integration gate"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn expected_execution_time(&self) -> Duration {
        self.expected
    }

    fn validate_configuration(&self) -> bool {
        self.valid
    }
}

#[async_trait]
impl GateExecutable for ScriptedGate {
    fn execute(&self) -> CoreResult<GateResult> {
        self.enter();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.leave();
        self.outcome()
    }

    async fn execute_async(&self) -> CoreResult<GateResult> {
        self.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.leave();
        self.outcome()
    }
}

/// Orchestrator with a deterministic, non-interactive environment.
pub fn orchestrator() -> GateOrchestrator {
    orchestrator_with_vars(&[])
}

pub fn orchestrator_with_vars(vars: &[(&str, &str)]) -> GateOrchestrator {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    GateOrchestrator::default().with_environment(EnvironmentDetector::from_vars(vars, false))
}
