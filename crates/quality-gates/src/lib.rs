//! Gatekeeper Quality Gates
//!
//! Run-level types and the pure pieces of the orchestration pipeline. These
//! compile independently of the engine that drives them:
//!
//! - `models` - Normalized results (IndividualGateResult, CompositeRunResult, ExecutionRecord, RunPhase)
//! - `thresholds` - Failure threshold value object consulted by gates
//! - `validator` - Pre-run configuration validation
//! - `aggregator` - Merging per-gate results into one verdict
//! - `history` - Bounded execution history and trend queries
//! - `environment` - Build identifier and environment tag detection
//!
//! The execution engine itself lives in the root crate's
//! `services::orchestrator` module.

pub mod aggregator;
pub mod environment;
pub mod history;
pub mod models;
pub mod thresholds;
pub mod validator;

// Re-export model types
pub use models::{
    panic_message, CompositeRunResult, ExecutionRecord, IndividualGateResult, RunOutcome,
    RunPhase,
};

// Re-export pipeline pieces
pub use aggregator::{namespaced_metric, ResultAggregator};
pub use environment::{EnvironmentDetector, ExecutionEnvironment, RunContext};
pub use history::{GateTrend, HistoryLedger, MetricTrend, DEFAULT_HISTORY_CAPACITY};
pub use thresholds::ThresholdConfiguration;
pub use validator::{
    ConfigValidationResult, ConfigurationValidator, ValidationRules, NO_GATES_WARNING,
};
