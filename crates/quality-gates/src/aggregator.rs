//! Result Aggregator
//!
//! Merges normalized per-gate results into one `CompositeRunResult`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{CompositeRunResult, IndividualGateResult};

/// Stateless merger of per-gate results.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Merge `gate_results` (in execution order) into a composite result.
    ///
    /// The run fails iff at least one critical gate failed. Messages from
    /// non-critical gates are still carried so they stay visible.
    pub fn aggregate(
        gate_results: Vec<IndividualGateResult>,
        started_at: DateTime<Utc>,
        execution_time: Duration,
    ) -> CompositeRunResult {
        let mut error_messages = Vec::new();
        let mut warning_messages = Vec::new();
        let mut metrics = BTreeMap::new();

        for result in &gate_results {
            let tag = if result.is_critical {
                format!("[{}]", result.gate_name)
            } else {
                format!("[{}] (non-critical)", result.gate_name)
            };

            for error in &result.error_messages {
                error_messages.push(format!("{} {}", tag, error));
            }
            if !result.success && result.error_messages.is_empty() {
                let reason = if result.summary.is_empty() {
                    "Gate failed without reporting an error"
                } else {
                    result.summary.as_str()
                };
                error_messages.push(format!("{} {}", tag, reason));
            }
            for warning in &result.warning_messages {
                warning_messages.push(format!("{} {}", tag, warning));
            }
            for (key, value) in &result.metrics {
                let namespaced = namespaced_metric(&result.gate_name, key);
                if metrics.insert(namespaced.clone(), value.clone()).is_some() {
                    tracing::warn!(
                        gate = %result.gate_name,
                        metric = %namespaced,
                        "Metric key collision; earlier value overwritten"
                    );
                    warning_messages.push(format!(
                        "{} metric '{}' overwrote an earlier value with the same key",
                        tag, namespaced
                    ));
                }
            }
        }

        let total_gates = gate_results.len();
        let passed_gates = gate_results.iter().filter(|r| r.success).count();
        let failed_gates = total_gates - passed_gates;
        let critical_failures = gate_results
            .iter()
            .filter(|r| r.is_critical_failure())
            .count();
        let success = critical_failures == 0;

        CompositeRunResult {
            summary: Self::summarize(total_gates, passed_gates, failed_gates, critical_failures),
            gate_results,
            error_messages,
            warning_messages,
            metrics,
            success,
            executed_at: started_at,
            execution_time_ms: execution_time.as_millis() as u64,
            total_gates,
            passed_gates,
            failed_gates,
            critical_failures,
        }
    }

    /// One-sentence run summary.
    pub fn summarize(
        total_gates: usize,
        passed_gates: usize,
        failed_gates: usize,
        critical_failures: usize,
    ) -> String {
        let verdict = if critical_failures == 0 { "PASS" } else { "FAIL" };
        format!(
            "{} gate(s) executed: {} passed, {} failed ({} critical failure(s)). Overall result: {}",
            total_gates, passed_gates, failed_gates, critical_failures, verdict
        )
    }
}

/// Key under which a gate's metric is merged: `<gateName>_<metricKey>`.
pub fn namespaced_metric(gate_name: &str, metric_key: &str) -> String {
    format!("{}_{}", gate_name, metric_key)
}
