//! Async Execution Integration Tests
//!
//! Async entry points, detached completion and run serialization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gatekeeper::RunPhase;

use crate::support::{execution_log, orchestrator, Behavior, ScriptedGate};

#[tokio::test(flavor = "multi_thread")]
async fn test_run_all_async_matches_sync_semantics() {
    let engine = Arc::new(orchestrator());
    let log = execution_log();
    engine
        .register(Arc::new(
            ScriptedGate::new("Slow", 10, true, Behavior::Pass)
                .taking(Duration::from_millis(20))
                .logging_to(&log),
        ))
        .unwrap();
    engine
        .register(Arc::new(
            ScriptedGate::new("First", 90, false, Behavior::Error).logging_to(&log),
        ))
        .unwrap();

    let result = engine.run_all_async().await;
    assert!(result.success);
    assert_eq!(*log.lock().unwrap(), vec!["First", "Slow"]);
    assert!(!result.gate_results[0].success);
    assert!(result.gate_results[1].success);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.phase(), RunPhase::Completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_panic_becomes_failed_result() {
    let engine = Arc::new(orchestrator());
    engine.register(Arc::new(ScriptedGate::new("Boom", 1, true, Behavior::Panic))).unwrap();

    let result = engine.run_all_async().await;
    assert!(!result.success);
    assert_eq!(
        result.gate_results[0].error_messages,
        vec!["Gate 'Boom' threw an exception: Boom blew up"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropped_async_run_still_completes() {
    let engine = Arc::new(orchestrator());
    let gate = ScriptedGate::new("Long", 10, true, Behavior::Pass).taking(Duration::from_millis(150));
    let calls = Arc::clone(&gate.calls);
    engine.register(Arc::new(gate)).unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), engine.run_all_async()).await;
    assert!(timed_out.is_err());

    for _ in 0..100 {
        if !engine.history().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.history().len(), 1);
    assert!(engine.history()[0].outcome.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_specific_async() {
    let engine = Arc::new(orchestrator());
    engine.register(Arc::new(ScriptedGate::new("Lint", 5, false, Behavior::Fail))).unwrap();

    let result = engine.run_specific_async("Lint").await;
    assert!(!result.success);
    assert_eq!(result.error_messages, vec!["Lint check failed"]);

    let missing = engine.run_specific_async("missing").await;
    assert_eq!(missing.error_messages, vec!["Gate 'missing' is not registered"]);
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_concurrent_runs_never_overlap() {
    let engine = Arc::new(orchestrator());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    for (name, priority) in [("A", 3), ("B", 2), ("C", 1)] {
        engine
            .register(Arc::new(
                ScriptedGate::new(name, priority, false, Behavior::Pass)
                    .taking(Duration::from_millis(10))
                    .tracking(&in_flight, &max_in_flight),
            ))
            .unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.run_all())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().success);
    }

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(engine.history().len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_and_async_runs_are_serialized() {
    let engine = Arc::new(orchestrator());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    engine
        .register(Arc::new(
            ScriptedGate::new("Shared", 1, true, Behavior::Pass)
                .taking(Duration::from_millis(30))
                .tracking(&in_flight, &max_in_flight),
        ))
        .unwrap();

    let sync_engine = Arc::clone(&engine);
    let sync_run = tokio::task::spawn_blocking(move || sync_engine.run_all());
    let async_run = engine.run_all_async();

    let (sync_result, async_result) = tokio::join!(sync_run, async_run);
    assert!(sync_result.unwrap().success);
    assert!(async_result.success);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(engine.history().len(), 2);
}
