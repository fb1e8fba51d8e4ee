//! Gate Execution Engine
//!
//! `GateOrchestrator` owns the registry, thresholds and history of one
//! orchestration context. Construct one per process (or per test) and pass it
//! to whoever needs it.
//!
//! A run moves through `Validating -> Executing(gate)... -> Aggregating ->
//! Completed|Failed`. Gates run strictly one at a time in descending priority,
//! ties in registration order. A gate that errors or panics is turned into a
//! failing result and the run continues with the next gate.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use chrono::Utc;
use futures_util::FutureExt;
use gatekeeper_core::{CoreError, CoreResult, Gate, GateRegistry, GateResult};
use gatekeeper_quality_gates::{
    panic_message, CompositeRunResult, ConfigValidationResult, ConfigurationValidator,
    EnvironmentDetector, ExecutionRecord, HistoryLedger, IndividualGateResult, ResultAggregator,
    RunOutcome, RunPhase, ThresholdConfiguration,
};

use crate::storage::config::OrchestratorConfig;
use crate::utils::error::{AppError, AppResult};

/// What executing one gate produced: a returned result, a returned error, or a panic.
type GateOutcome = std::thread::Result<CoreResult<GateResult>>;

/// The gate orchestration engine.
pub struct GateOrchestrator {
    registry: RwLock<GateRegistry>,
    thresholds: RwLock<Arc<ThresholdConfiguration>>,
    validator: ConfigurationValidator,
    history: HistoryLedger,
    environment: EnvironmentDetector,
    phase: RwLock<RunPhase>,
    /// Held for the whole of a run so no two runs interleave their gates.
    run_guard: Mutex<()>,
    report_history_limit: usize,
}

impl GateOrchestrator {
    /// Create an orchestrator from validated configuration.
    pub fn new(config: OrchestratorConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        let history = HistoryLedger::new(config.history_capacity)?;
        Ok(Self::assemble(config, history))
    }

    fn assemble(config: OrchestratorConfig, history: HistoryLedger) -> Self {
        let environment =
            EnvironmentDetector::from_process().with_build_id_vars(config.build_id_env_vars);

        Self {
            registry: RwLock::new(GateRegistry::new()),
            thresholds: RwLock::new(Arc::new(config.thresholds)),
            validator: ConfigurationValidator::new(config.validation),
            history,
            environment,
            phase: RwLock::new(RunPhase::NotStarted),
            run_guard: Mutex::new(()),
            report_history_limit: config.report_history_limit,
        }
    }

    /// Replace the environment detector used for history records.
    pub fn with_environment(mut self, environment: EnvironmentDetector) -> Self {
        self.environment = environment;
        self
    }

    fn registry_read(&self) -> RwLockReadGuard<'_, GateRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, GateRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: RunPhase) {
        tracing::debug!(phase = %phase, "Run phase changed");
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register a gate, replacing any gate with the same name.
    ///
    /// Fails with `InvalidArgument` when the gate's name is empty or when
    /// reading its metadata panics.
    pub fn register(&self, gate: Arc<dyn Gate>) -> CoreResult<()> {
        let (name, priority, critical) = panic::catch_unwind(AssertUnwindSafe(|| {
            (gate.name().to_string(), gate.priority(), gate.is_critical())
        }))
        .map_err(|payload| {
            CoreError::invalid_argument(format!(
                "gate metadata panicked: {}",
                panic_message(payload.as_ref())
            ))
        })?;

        match self.registry_write().register(gate)? {
            Some(_) => tracing::info!(gate = %name, "Replaced previously registered gate"),
            None => tracing::info!(gate = %name, priority, critical, "Registered gate"),
        }
        Ok(())
    }

    /// Unregister a gate. Unknown names are a no-op. Returns whether a gate was removed.
    pub fn unregister(&self, name: &str) -> bool {
        match self.registry_write().unregister(name) {
            Some(_) => {
                tracing::info!(gate = %name, "Unregistered gate");
                true
            }
            None => {
                tracing::warn!(gate = %name, "Cannot unregister gate: not registered");
                false
            }
        }
    }

    /// Snapshot of registered gates in registration order.
    pub fn list_registered(&self) -> Vec<Arc<dyn Gate>> {
        self.registry_read().snapshot()
    }

    /// Snapshot of registered gates in the order a run would execute them.
    pub fn execution_order(&self) -> Vec<Arc<dyn Gate>> {
        self.registry_read().execution_order()
    }

    /// Validate the currently registered gates without running them.
    pub fn validate_configuration(&self) -> ConfigValidationResult {
        let gates = self.registry_read().snapshot();
        self.validator.validate(&gates)
    }

    // ========================================================================
    // Thresholds
    // ========================================================================

    /// Atomically replace the failure thresholds.
    pub fn set_failure_threshold(&self, thresholds: ThresholdConfiguration) -> CoreResult<()> {
        thresholds.validate()?;
        *self.thresholds.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(thresholds);
        tracing::info!("Failure thresholds updated");
        Ok(())
    }

    /// Current failure thresholds.
    pub fn failure_threshold(&self) -> Arc<ThresholdConfiguration> {
        Arc::clone(&self.thresholds.read().unwrap_or_else(|e| e.into_inner()))
    }

    // ========================================================================
    // History & state
    // ========================================================================

    /// Snapshot of the execution history, most recent last.
    pub fn history(&self) -> Vec<ExecutionRecord> {
        self.history.history()
    }

    /// The ledger itself, for trend queries.
    pub fn history_ledger(&self) -> &HistoryLedger {
        &self.history
    }

    /// Current run phase.
    pub fn phase(&self) -> RunPhase {
        self.phase.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of records shown in generated reports.
    pub fn report_history_limit(&self) -> usize {
        self.report_history_limit
    }

    /// Markdown report of gates, thresholds, history and trends.
    pub fn generate_report(&self) -> String {
        super::report::generate_report(self)
    }

    /// Build identifier that the next history record would carry.
    pub fn current_build_identifier(&self) -> String {
        self.environment.build_identifier(Utc::now())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run every registered gate on the calling thread.
    ///
    /// Always returns a result: configuration problems, gate errors and gate
    /// panics all come back as failing entries rather than propagating.
    pub fn run_all(&self) -> CompositeRunResult {
        self.run_all_with(|gate| panic::catch_unwind(AssertUnwindSafe(|| gate.execute())))
    }

    /// Run every registered gate without blocking the caller's task.
    ///
    /// Gates still run one at a time on a single blocking worker, through
    /// their `execute_async` entry point. Dropping the returned future does not
    /// stop the run; it completes and is journaled regardless.
    pub async fn run_all_async(self: &Arc<Self>) -> CompositeRunResult {
        let this = Arc::clone(self);
        let handle = tokio::runtime::Handle::current();

        let joined = tokio::task::spawn_blocking(move || {
            this.run_all_with(|gate| {
                handle.block_on(AssertUnwindSafe(gate.execute_async()).catch_unwind())
            })
        })
        .await;

        joined.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Gate run worker terminated abnormally");
            self.set_phase(RunPhase::Failed);
            CompositeRunResult::internal_failure(format!("Gate run worker terminated: {}", e))
        })
    }

    /// Run a single named gate on the calling thread.
    ///
    /// An unknown name yields a failed result, never an error.
    pub fn run_specific(&self, name: &str) -> GateResult {
        self.run_specific_with(name, |gate| {
            panic::catch_unwind(AssertUnwindSafe(|| gate.execute()))
        })
    }

    /// Async counterpart of `run_specific`.
    pub async fn run_specific_async(self: &Arc<Self>, name: &str) -> GateResult {
        let this = Arc::clone(self);
        let handle = tokio::runtime::Handle::current();
        let gate_name = name.to_string();

        let joined = tokio::task::spawn_blocking(move || {
            this.run_specific_with(&gate_name, |gate| {
                handle.block_on(AssertUnwindSafe(gate.execute_async()).catch_unwind())
            })
        })
        .await;

        joined.unwrap_or_else(|e| {
            tracing::error!(gate = %name, error = %e, "Gate run worker terminated abnormally");
            self.set_phase(RunPhase::Failed);
            GateResult::failed(name, format!("Gate run worker terminated: {}", e))
        })
    }

    fn run_all_with<F>(&self, execute: F) -> CompositeRunResult
    where
        F: Fn(&Arc<dyn Gate>) -> GateOutcome,
    {
        let _run = self.run_guard.lock().unwrap_or_else(|e| e.into_inner());
        let started_at = Utc::now();
        let clock = Instant::now();

        self.set_phase(RunPhase::Validating);
        let gates = self.registry_read().execution_order();
        tracing::info!(gates = gates.len(), "Starting gate run");

        let validation = self.validator.validate(&gates);
        if !validation.is_valid {
            tracing::warn!(
                issues = validation.issues.len(),
                "Gate run aborted: configuration invalid"
            );
            self.set_phase(RunPhase::Failed);
            return CompositeRunResult::configuration_failure(validation.issues, validation.warnings);
        }

        let mut results = Vec::with_capacity(gates.len());
        for gate in &gates {
            self.set_phase(RunPhase::Executing(gate.name().to_string()));
            results.push(self.execute_gate(gate, &execute));
        }

        self.set_phase(RunPhase::Aggregating);
        let mut composite = ResultAggregator::aggregate(results, started_at, clock.elapsed());
        let mut warnings: Vec<String> = validation
            .warnings
            .into_iter()
            .map(|w| format!("[configuration] {}", w))
            .collect();
        warnings.append(&mut composite.warning_messages);
        composite.warning_messages = warnings;

        self.journal(RunOutcome::Composite(composite.clone()));
        self.set_phase(if composite.success {
            RunPhase::Completed
        } else {
            RunPhase::Failed
        });

        tracing::info!(
            success = composite.success,
            elapsed_ms = composite.execution_time_ms,
            "{}",
            composite.summary
        );
        composite
    }

    fn run_specific_with<F>(&self, name: &str, execute: F) -> GateResult
    where
        F: Fn(&Arc<dyn Gate>) -> GateOutcome,
    {
        let _run = self.run_guard.lock().unwrap_or_else(|e| e.into_inner());

        let gate = match self.registry_read().require(name) {
            Ok(gate) => gate,
            Err(err) => {
                tracing::warn!(gate = %name, error = %err, "Cannot run gate");
                let message = match err {
                    CoreError::NotFound(message) => message,
                    other => other.to_string(),
                };
                return GateResult::failed(name, message).with_summary("Gate not found");
            }
        };

        self.set_phase(RunPhase::Executing(name.to_string()));
        let result = self.execute_gate(&gate, &execute);

        self.journal(RunOutcome::SingleGate(result.clone()));
        self.set_phase(if result.success {
            RunPhase::Completed
        } else {
            RunPhase::Failed
        });
        result.to_gate_result()
    }

    /// Execute one gate and normalize whatever it produced.
    fn execute_gate<F>(&self, gate: &Arc<dyn Gate>, execute: &F) -> IndividualGateResult
    where
        F: Fn(&Arc<dyn Gate>) -> GateOutcome,
    {
        let name = gate.name().to_string();
        let critical = gate.is_critical();
        let priority = gate.priority();

        let clock = Instant::now();
        let outcome = execute(gate);
        let elapsed_ms = clock.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                let mut normalized =
                    IndividualGateResult::from_gate_result(&name, critical, priority, result);
                if normalized.execution_time_ms == 0 {
                    normalized.execution_time_ms = elapsed_ms;
                }
                if normalized.success {
                    tracing::debug!(gate = %name, elapsed_ms, "Gate passed");
                } else {
                    tracing::warn!(gate = %name, critical, elapsed_ms, "Gate failed");
                }
                normalized
            }
            Ok(Err(err)) => {
                tracing::warn!(gate = %name, critical, error = %err, "Gate returned an error");
                IndividualGateResult::execution_error(
                    &name,
                    critical,
                    priority,
                    &err.to_string(),
                    elapsed_ms,
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(gate = %name, critical, panic = %message, "Gate panicked");
                IndividualGateResult::execution_error(&name, critical, priority, &message, elapsed_ms)
            }
        }
    }

    fn journal(&self, outcome: RunOutcome) {
        let record = self
            .history
            .record(outcome, self.environment.capture(Utc::now()));
        tracing::debug!(
            run_id = %record.run_id,
            build = %record.build_identifier,
            environment = %record.environment,
            "Run recorded in history"
        );
    }
}

impl Default for GateOrchestrator {
    fn default() -> Self {
        Self::assemble(OrchestratorConfig::default(), HistoryLedger::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
