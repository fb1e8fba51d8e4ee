//! Orchestrator Integration Tests
//!
//! Registration, configuration validation and synchronous execution.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use gatekeeper::{CoreError, GateOrchestrator, RunPhase, ThresholdConfiguration};
use serde_json::Value;

use crate::support::{execution_log, orchestrator, Behavior, ScriptedGate};

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_and_list() {
    let engine = orchestrator();
    engine.register(Arc::new(ScriptedGate::new("Compile", 100, true, Behavior::Pass))).unwrap();
    engine.register(Arc::new(ScriptedGate::new("Lint", 10, false, Behavior::Pass))).unwrap();

    let names: Vec<String> = engine
        .list_registered()
        .iter()
        .map(|g| g.name().to_string())
        .collect();
    assert_eq!(names, vec!["Compile", "Lint"]);
}

#[test]
fn test_register_empty_name_rejected() {
    let engine = orchestrator();
    let err = engine
        .register(Arc::new(ScriptedGate::new("", 1, true, Behavior::Pass)))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
    assert!(engine.list_registered().is_empty());
}

#[test]
fn test_reregistration_replaces_gate() {
    let engine = orchestrator();
    let first = ScriptedGate::new("Tests", 50, true, Behavior::Fail);
    let first_calls = Arc::clone(&first.calls);
    let second = ScriptedGate::new("Tests", 50, true, Behavior::Pass);
    let second_calls = Arc::clone(&second.calls);

    engine.register(Arc::new(first)).unwrap();
    engine.register(Arc::new(second)).unwrap();
    assert_eq!(engine.list_registered().len(), 1);

    let result = engine.run_all();
    assert!(result.success);
    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unregister_removes_gate_from_runs() {
    let engine = orchestrator();
    let gate = ScriptedGate::new("Flaky", 5, true, Behavior::Fail);
    let calls = Arc::clone(&gate.calls);
    engine.register(Arc::new(gate)).unwrap();

    assert!(engine.unregister("Flaky"));
    assert!(!engine.unregister("Flaky"));

    let result = engine.run_all();
    assert!(result.success);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_list_is_a_snapshot() {
    let engine = orchestrator();
    engine.register(Arc::new(ScriptedGate::new("A", 1, true, Behavior::Pass))).unwrap();
    let snapshot = engine.list_registered();

    engine.register(Arc::new(ScriptedGate::new("B", 2, true, Behavior::Pass))).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(engine.list_registered().len(), 2);
}

// ============================================================================
// Configuration Validation
// ============================================================================

#[test]
fn test_empty_registry_is_valid_with_one_warning() {
    let engine = orchestrator();
    let validation = engine.validate_configuration();
    assert!(validation.is_valid);
    assert!(validation.issues.is_empty());
    assert_eq!(validation.warnings, vec!["No gates registered"]);
}

#[test]
fn test_metadata_warnings_do_not_invalidate() {
    let engine = orchestrator();
    engine.register(Arc::new(ScriptedGate::new("Negative", -5, false, Behavior::Pass))).unwrap();
    engine
        .register(Arc::new(
            ScriptedGate::new("Soak", 10, false, Behavior::Pass)
                .expecting(Duration::from_secs(3600)),
        ))
        .unwrap();
    engine.register(Arc::new(ScriptedGate::new("BuildA", 80, true, Behavior::Pass))).unwrap();
    engine.register(Arc::new(ScriptedGate::new("BuildB", 80, true, Behavior::Pass))).unwrap();

    let validation = engine.validate_configuration();
    assert!(validation.is_valid);
    assert_eq!(validation.warnings.len(), 3);
    assert!(validation.warnings.iter().any(|w| w.contains("'Negative' has priority -5")));
    assert!(validation.warnings.iter().any(|w| w.contains("'Soak' expects 3600s")));
    assert!(validation
        .warnings
        .iter()
        .any(|w| w == "Critical gates 'BuildA', 'BuildB' share priority 80"));
}

#[test]
fn test_invalid_gate_blocks_every_gate() {
    let engine = orchestrator();
    let healthy = ScriptedGate::new("Healthy", 100, true, Behavior::Pass);
    let healthy_calls = Arc::clone(&healthy.calls);
    engine.register(Arc::new(healthy)).unwrap();
    engine
        .register(Arc::new(ScriptedGate::new("Misconfigured", 10, false, Behavior::Pass).invalid()))
        .unwrap();

    let result = engine.run_all();
    assert!(!result.success);
    assert!(result.gate_results.is_empty());
    assert_eq!(
        result.error_messages,
        vec!["Gate 'Misconfigured' reported an invalid configuration"]
    );
    assert_eq!(healthy_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.phase(), RunPhase::Failed);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_runs_in_descending_priority_with_stable_ties() {
    let engine = orchestrator();
    let log = execution_log();
    for (name, priority) in [("Docs", 1), ("Build", 100), ("UnitA", 50), ("UnitB", 50), ("Perf", 75)] {
        engine
            .register(Arc::new(
                ScriptedGate::new(name, priority, false, Behavior::Pass).logging_to(&log),
            ))
            .unwrap();
    }

    let result = engine.run_all();
    let expected = vec!["Build", "Perf", "UnitA", "UnitB", "Docs"];
    assert_eq!(*log.lock().unwrap(), expected);
    let reported: Vec<&str> = result.gate_results.iter().map(|r| r.gate_name.as_str()).collect();
    assert_eq!(reported, expected);
}

#[test]
fn test_critical_failure_fails_run() {
    let engine = orchestrator();
    engine.register(Arc::new(ScriptedGate::new("Compile", 100, true, Behavior::Fail))).unwrap();
    engine.register(Arc::new(ScriptedGate::new("Lint", 10, false, Behavior::Pass))).unwrap();

    let result = engine.run_all();
    assert!(!result.success);
    assert_eq!(result.total_gates, 2);
    assert_eq!(result.passed_gates, 1);
    assert_eq!(result.failed_gates, 1);
    assert_eq!(result.critical_failures, 1);
    assert_eq!(result.error_messages, vec!["[Compile] Compile check failed"]);
    assert!(result.summary.ends_with("Overall result: FAIL"));
}

#[test]
fn test_non_critical_failure_keeps_run_green() {
    let engine = orchestrator();
    engine.register(Arc::new(ScriptedGate::new("Compile", 100, true, Behavior::Pass))).unwrap();
    engine.register(Arc::new(ScriptedGate::new("Style", 10, false, Behavior::Fail))).unwrap();

    let result = engine.run_all();
    assert!(result.success);
    assert_eq!(result.failed_gates, 1);
    assert_eq!(result.critical_failures, 0);
    assert_eq!(
        result.error_messages,
        vec!["[Style] (non-critical) Style check failed"]
    );
    assert_eq!(
        result.summary,
        "2 gate(s) executed: 1 passed, 1 failed (0 critical failure(s)). Overall result: PASS"
    );
    assert_eq!(engine.phase(), RunPhase::Completed);
}

#[test]
fn test_error_and_panic_are_isolated() {
    let engine = orchestrator();
    let log = execution_log();
    engine
        .register(Arc::new(ScriptedGate::new("Crashy", 90, true, Behavior::Panic).logging_to(&log)))
        .unwrap();
    engine
        .register(Arc::new(ScriptedGate::new("Missing", 80, false, Behavior::Error).logging_to(&log)))
        .unwrap();
    engine
        .register(Arc::new(ScriptedGate::new("After", 70, true, Behavior::Pass).logging_to(&log)))
        .unwrap();

    let result = engine.run_all();
    assert_eq!(*log.lock().unwrap(), vec!["Crashy", "Missing", "After"]);
    assert!(!result.success);
    assert_eq!(result.critical_failures, 1);

    let crashy = result.gate_result("Crashy").unwrap();
    assert_eq!(
        crashy.error_messages,
        vec!["Gate 'Crashy' threw an exception: Crashy blew up"]
    );
    assert_eq!(crashy.summary, "Gate execution error");

    let missing = result.gate_result("Missing").unwrap();
    assert!(missing.error_messages[0].contains("tool not installed"));
    assert!(result.gate_result("After").unwrap().success);
}

#[test]
fn test_metrics_and_warnings_are_namespaced() {
    let engine = orchestrator();
    engine
        .register(Arc::new(
            ScriptedGate::new("Perf", 50, true, Behavior::Pass)
                .with_metric("AverageFPS", 58.5)
                .with_warning("frame spikes above 40ms"),
        ))
        .unwrap();
    engine
        .register(Arc::new(
            ScriptedGate::new("Memory", 40, false, Behavior::Pass).with_metric("PeakMB", 300.0),
        ))
        .unwrap();

    let result = engine.run_all();
    assert_eq!(result.metrics.get("Perf_AverageFPS"), Some(&Value::from(58.5)));
    assert_eq!(result.metrics.get("Memory_PeakMB"), Some(&Value::from(300.0)));
    assert_eq!(result.warning_messages, vec!["[Perf] frame spikes above 40ms"]);
}

#[test]
fn test_empty_registry_run_succeeds() {
    let engine = orchestrator();
    let result = engine.run_all();
    assert!(result.success);
    assert_eq!(result.total_gates, 0);
    assert_eq!(result.warning_messages, vec!["[configuration] No gates registered"]);
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_run_specific() {
    let engine = orchestrator();
    let target = ScriptedGate::new("Tests", 10, true, Behavior::Fail);
    let target_calls = Arc::clone(&target.calls);
    let other = ScriptedGate::new("Build", 100, true, Behavior::Pass);
    let other_calls = Arc::clone(&other.calls);
    engine.register(Arc::new(target)).unwrap();
    engine.register(Arc::new(other)).unwrap();

    let result = engine.run_specific("Tests");
    assert!(!result.success);
    assert_eq!(result.gate_name, "Tests");
    assert_eq!(result.error_messages, vec!["Tests check failed"]);
    assert_eq!(target_calls.load(Ordering::SeqCst), 1);
    assert_eq!(other_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_run_specific_missing_gate() {
    let engine = orchestrator();
    let result = engine.run_specific("missing");
    assert!(!result.success);
    assert_eq!(result.error_messages, vec!["Gate 'missing' is not registered"]);
    assert!(engine.history().is_empty());
}

#[test]
fn test_thresholds_are_shared_state() {
    let engine = GateOrchestrator::default();
    assert_eq!(engine.failure_threshold().max_memory_mb, 512.0);

    let updated = (*engine.failure_threshold())
        .clone()
        .with_max_memory_mb(1024.0)
        .with_custom("max_draw_calls", 2000.0);
    engine.set_failure_threshold(updated).unwrap();

    let current = engine.failure_threshold();
    assert_eq!(current.max_memory_mb, 1024.0);
    assert_eq!(current.custom_threshold("max_draw_calls"), Some(2000.0));
}

#[test]
fn test_negative_custom_threshold_is_stored() {
    let engine = GateOrchestrator::default();
    engine
        .set_failure_threshold(ThresholdConfiguration::default().with_custom("min_fps_delta", -5.0))
        .unwrap();
    assert_eq!(
        engine.failure_threshold().custom_threshold("min_fps_delta"),
        Some(-5.0)
    );

    let err = engine
        .set_failure_threshold(ThresholdConfiguration::default().with_custom("ratio", f64::INFINITY))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}
