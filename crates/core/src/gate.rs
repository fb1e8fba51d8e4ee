//! Gate Contract
//!
//! Defines the boundary every validation unit implements, split like the
//! registry needs it:
//!
//! - `GateDefinition` - Identity, priority, criticality, self-validation, status
//! - `GateExecutable` - Blocking and async execution
//! - `Gate` - Combined trait (auto-implemented via blanket impl)
//!
//! Concrete gates (test runners, compiler checks, profilers) live outside this
//! workspace and are consumed as `Arc<dyn Gate>`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreResult;

// ============================================================================
// Gate Status
// ============================================================================

/// Self-reported lifecycle status of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Gate is idle and able to run
    Ready,
    /// Gate is currently running
    Executing,
    /// Gate's last run completed
    Completed,
    /// Gate's last run failed
    Failed,
    /// Gate cannot run with its current configuration
    ConfigurationError,
    /// Gate has been switched off by its owner
    Disabled,
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Ready => write!(f, "ready"),
            GateStatus::Executing => write!(f, "executing"),
            GateStatus::Completed => write!(f, "completed"),
            GateStatus::Failed => write!(f, "failed"),
            GateStatus::ConfigurationError => write!(f, "configuration_error"),
            GateStatus::Disabled => write!(f, "disabled"),
        }
    }
}

// ============================================================================
// Gate Result
// ============================================================================

/// Result reported by a gate for one execution.
///
/// `success` must be false whenever one of the errors is unrecoverable for the
/// gate. Warnings alone never make a result fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    /// Name of the gate that produced the result
    pub gate_name: String,
    /// Whether the gate passed
    pub success: bool,
    /// When the gate was executed
    pub executed_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub execution_time_ms: u64,
    /// Gate-specific measurements
    pub metrics: BTreeMap<String, Value>,
    /// Errors in the order the gate reported them
    pub error_messages: Vec<String>,
    /// Warnings in the order the gate reported them
    pub warning_messages: Vec<String>,
    /// One-line outcome description
    pub summary: String,
    /// Optional path to profiling output written by the gate
    pub profiling_data_path: Option<PathBuf>,
}

impl GateResult {
    fn new(gate_name: impl Into<String>, success: bool, summary: impl Into<String>) -> Self {
        Self {
            gate_name: gate_name.into(),
            success,
            executed_at: Utc::now(),
            execution_time_ms: 0,
            metrics: BTreeMap::new(),
            error_messages: Vec::new(),
            warning_messages: Vec::new(),
            summary: summary.into(),
            profiling_data_path: None,
        }
    }

    /// Create a passing result.
    pub fn passed(gate_name: impl Into<String>, execution_time_ms: u64) -> Self {
        Self::new(gate_name, true, "Gate passed").with_execution_time_ms(execution_time_ms)
    }

    /// Create a failing result carrying one error message.
    pub fn failed(gate_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(gate_name, false, "Gate failed").with_error(error)
    }

    /// Set the execution time
    pub fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    /// Record a metric
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.into(), value.into());
        self
    }

    /// Append an error message
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_messages.push(error.into());
        self
    }

    /// Append a warning message
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning_messages.push(warning.into());
        self
    }

    /// Replace the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Attach a profiling data path
    pub fn with_profiling_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.profiling_data_path = Some(path.into());
        self
    }
}

// ============================================================================
// Trait Definitions
// ============================================================================

/// Gate identity and metadata.
///
/// The orchestrator reads these to order, classify and sanity-check gates
/// without running them. Getters must be cheap and must not panic; a panic
/// from `name`, `priority` or `is_critical` makes registration fail with
/// `InvalidArgument`.
pub trait GateDefinition: Send + Sync {
    /// Unique, non-empty name used as the registry key.
    fn name(&self) -> &str;

    /// Human-readable description of what the gate checks.
    fn description(&self) -> &str;

    /// Execution priority. Higher runs first.
    fn priority(&self) -> i32;

    /// Whether a failure of this gate fails the whole run.
    fn is_critical(&self) -> bool;

    /// Advisory runtime estimate. Never enforced.
    fn expected_execution_time(&self) -> Duration {
        Duration::from_secs(60)
    }

    /// Whether the gate considers its own configuration usable.
    fn validate_configuration(&self) -> bool {
        true
    }

    /// Current lifecycle status.
    fn status(&self) -> GateStatus {
        GateStatus::Ready
    }
}

/// Gate execution capability.
///
/// An `Err` is treated exactly like a thrown exception: the orchestrator turns
/// it into a failing result and keeps going.
#[async_trait]
pub trait GateExecutable: Send + Sync {
    /// Run the gate on the calling thread.
    fn execute(&self) -> CoreResult<GateResult>;

    /// Run the gate asynchronously. Defaults to the blocking path.
    async fn execute_async(&self) -> CoreResult<GateResult> {
        self.execute()
    }
}

/// Combined trait for gates that provide both definition and execution.
pub trait Gate: GateDefinition + GateExecutable {}

// Blanket implementation: anything that implements both traits is a Gate
impl<T: GateDefinition + GateExecutable> Gate for T {}

// ============================================================================
// Tests
// ============================================================================
