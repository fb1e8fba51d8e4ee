//! Run Result Models
//!
//! Normalized, engine-produced records of gate executions and whole runs.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use gatekeeper_core::GateResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::environment::ExecutionEnvironment;

// ============================================================================
// Run Phase
// ============================================================================

/// Where the orchestrator is within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "gate")]
pub enum RunPhase {
    /// No run has started yet
    NotStarted,
    /// Checking gate configuration before execution
    Validating,
    /// Running the named gate
    Executing(String),
    /// Merging per-gate results
    Aggregating,
    /// Last run finished with a passing verdict
    Completed,
    /// Last run finished with a failing verdict or was rejected by validation
    Failed,
}

impl RunPhase {
    /// Whether a run is currently in flight.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunPhase::Validating | RunPhase::Executing(_) | RunPhase::Aggregating
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::NotStarted => write!(f, "not_started"),
            RunPhase::Validating => write!(f, "validating"),
            RunPhase::Executing(gate) => write!(f, "executing({})", gate),
            RunPhase::Aggregating => write!(f, "aggregating"),
            RunPhase::Completed => write!(f, "completed"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// Individual Gate Result
// ============================================================================

/// A gate result captured at execution time together with the gate's
/// classification, so later changes to the gate don't rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualGateResult {
    /// Registered gate name
    pub gate_name: String,
    /// Whether the gate passed
    pub success: bool,
    /// Criticality at the moment of execution
    pub is_critical: bool,
    /// Priority at the moment of execution
    pub priority: i32,
    /// When the gate was executed
    pub executed_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub execution_time_ms: u64,
    /// Gate-specific measurements
    pub metrics: BTreeMap<String, Value>,
    /// Errors reported by the gate
    pub error_messages: Vec<String>,
    /// Warnings reported by the gate
    pub warning_messages: Vec<String>,
    /// One-line outcome description
    pub summary: String,
    /// Optional profiling output path
    pub profiling_data_path: Option<PathBuf>,
}

impl IndividualGateResult {
    /// Normalize a result returned by a gate.
    ///
    /// The registered name wins over whatever name the gate wrote into its result.
    pub fn from_gate_result(
        gate_name: &str,
        is_critical: bool,
        priority: i32,
        result: GateResult,
    ) -> Self {
        Self {
            gate_name: gate_name.to_string(),
            success: result.success,
            is_critical,
            priority,
            executed_at: result.executed_at,
            execution_time_ms: result.execution_time_ms,
            metrics: result.metrics,
            error_messages: result.error_messages,
            warning_messages: result.warning_messages,
            summary: result.summary,
            profiling_data_path: result.profiling_data_path,
        }
    }

    /// Synthetic failing result for a gate that raised instead of returning.
    pub fn execution_error(
        gate_name: &str,
        is_critical: bool,
        priority: i32,
        message: &str,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            gate_name: gate_name.to_string(),
            success: false,
            is_critical,
            priority,
            executed_at: Utc::now(),
            execution_time_ms,
            metrics: BTreeMap::new(),
            error_messages: vec![format!(
                "Gate '{}' threw an exception: {}",
                gate_name, message
            )],
            warning_messages: Vec::new(),
            summary: "Gate execution error".to_string(),
            profiling_data_path: None,
        }
    }

    /// Whether this result fails the overall run.
    pub fn is_critical_failure(&self) -> bool {
        !self.success && self.is_critical
    }

    /// Convert back into the gate-facing result shape.
    pub fn to_gate_result(&self) -> GateResult {
        GateResult {
            gate_name: self.gate_name.clone(),
            success: self.success,
            executed_at: self.executed_at,
            execution_time_ms: self.execution_time_ms,
            metrics: self.metrics.clone(),
            error_messages: self.error_messages.clone(),
            warning_messages: self.warning_messages.clone(),
            summary: self.summary.clone(),
            profiling_data_path: self.profiling_data_path.clone(),
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "gate panicked with a non-string payload".to_string()
    }
}

// ============================================================================
// Composite Run Result
// ============================================================================

/// Merged single-verdict output of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRunResult {
    /// Per-gate results in execution order
    pub gate_results: Vec<IndividualGateResult>,
    /// Errors from every gate, prefixed with the gate name
    pub error_messages: Vec<String>,
    /// Warnings from every gate, prefixed with the gate name
    pub warning_messages: Vec<String>,
    /// Metrics keyed by `<gateName>_<metricKey>`
    pub metrics: BTreeMap<String, Value>,
    /// False iff at least one critical gate failed
    pub success: bool,
    /// When the run started
    pub executed_at: DateTime<Utc>,
    /// Wall-clock duration of the whole run in milliseconds
    pub execution_time_ms: u64,
    /// Number of gates executed
    pub total_gates: usize,
    /// Number of gates that passed
    pub passed_gates: usize,
    /// Number of gates that failed
    pub failed_gates: usize,
    /// Number of failed critical gates
    pub critical_failures: usize,
    /// One-sentence outcome
    pub summary: String,
}

impl CompositeRunResult {
    /// Result of a run rejected by configuration validation. No gate executed.
    pub fn configuration_failure(issues: Vec<String>, warnings: Vec<String>) -> Self {
        let summary = format!(
            "Configuration validation failed with {} issue(s); no gates were executed. Overall result: FAIL",
            issues.len()
        );
        Self {
            gate_results: Vec::new(),
            error_messages: issues,
            warning_messages: warnings,
            metrics: BTreeMap::new(),
            success: false,
            executed_at: Utc::now(),
            execution_time_ms: 0,
            total_gates: 0,
            passed_gates: 0,
            failed_gates: 0,
            critical_failures: 0,
            summary,
        }
    }

    /// Result of a run that could not complete for reasons outside any gate.
    pub fn internal_failure(message: impl Into<String>) -> Self {
        Self {
            summary: "Gate run did not complete. Overall result: FAIL".to_string(),
            ..Self::configuration_failure(vec![message.into()], Vec::new())
        }
    }

    /// Names of gates that failed, in execution order.
    pub fn failed_gate_names(&self) -> Vec<&str> {
        self.gate_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.gate_name.as_str())
            .collect()
    }

    /// Look up the result of one gate.
    pub fn gate_result(&self, gate_name: &str) -> Option<&IndividualGateResult> {
        self.gate_results.iter().find(|r| r.gate_name == gate_name)
    }
}

// ============================================================================
// Execution Record
// ============================================================================

/// What a journaled run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "result")]
pub enum RunOutcome {
    /// A full `run_all`
    Composite(CompositeRunResult),
    /// A `run_specific` of one gate
    SingleGate(IndividualGateResult),
}

impl RunOutcome {
    /// Overall verdict of the recorded run.
    pub fn success(&self) -> bool {
        match self {
            RunOutcome::Composite(result) => result.success,
            RunOutcome::SingleGate(result) => result.success,
        }
    }

    /// Per-gate results contained in the run.
    pub fn gate_results(&self) -> &[IndividualGateResult] {
        match self {
            RunOutcome::Composite(result) => &result.gate_results,
            RunOutcome::SingleGate(result) => std::slice::from_ref(result),
        }
    }

    /// Wall-clock duration in milliseconds.
    pub fn execution_time_ms(&self) -> u64 {
        match self {
            RunOutcome::Composite(result) => result.execution_time_ms,
            RunOutcome::SingleGate(result) => result.execution_time_ms,
        }
    }
}

/// One immutable history ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the record was appended
    pub executed_at: DateTime<Utc>,
    /// The recorded run
    pub outcome: RunOutcome,
    /// Build identifier from the environment or a timestamp fallback
    pub build_identifier: String,
    /// CI / batch / interactive
    pub environment: ExecutionEnvironment,
    /// Free-form host information
    pub system_info: BTreeMap<String, String>,
}

// ============================================================================
// Tests
// ============================================================================
