//! Gate Orchestrator Module
//!
//! Registers quality gates, validates their configuration, runs them in
//! priority order and journals every run.

mod engine;
mod report;

pub use engine::GateOrchestrator;
pub use report::{generate_report, render_run_log, RUN_LOG_FAILED_BANNER, RUN_LOG_PASSED_BANNER};

