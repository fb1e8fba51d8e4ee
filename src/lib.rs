//! Gatekeeper - Quality Gate Orchestration
//!
//! This library runs a set of pluggable quality gates before a build is
//! accepted. It includes:
//! - The gate orchestrator (registration, validation, ordered execution)
//! - Markdown reporting over the run history
//! - TOML configuration and tracing setup
//!
//! The gate contract and registry live in `gatekeeper-core`; result models,
//! aggregation and the history ledger live in `gatekeeper-quality-gates`.

pub mod services;
pub mod storage;
pub mod utils;

// Re-export the engine
pub use services::orchestrator::{
    generate_report, render_run_log, GateOrchestrator, RUN_LOG_FAILED_BANNER, RUN_LOG_PASSED_BANNER,
};
pub use storage::config::{ConfigService, OrchestratorConfig};
pub use utils::error::{AppError, AppResult};
pub use utils::logging::init_tracing;

// Re-export the gate contract and result models
pub use gatekeeper_core::{
    CoreError, CoreResult, Gate, GateDefinition, GateExecutable, GateRegistry, GateResult,
    GateStatus,
};
pub use gatekeeper_quality_gates::{
    CompositeRunResult, ConfigValidationResult, EnvironmentDetector, ExecutionEnvironment,
    ExecutionRecord, GateTrend, IndividualGateResult, MetricTrend, RunOutcome, RunPhase,
    ThresholdConfiguration, ValidationRules,
};
