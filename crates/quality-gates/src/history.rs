//! Execution History Ledger
//!
//! Bounded, append-only, in-memory log of past runs with FIFO eviction, plus
//! the trend queries computed over it.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use chrono::Utc;
use gatekeeper_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::namespaced_metric;
use crate::environment::RunContext;
use crate::models::{ExecutionRecord, RunOutcome};

/// Default number of records retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Pass/fail statistics for one gate across the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateTrend {
    pub gate_name: String,
    pub runs: usize,
    pub passes: usize,
    pub failures: usize,
    pub critical_failures: usize,
    pub average_execution_time_ms: f64,
}

impl GateTrend {
    /// Fraction of runs that passed, in `[0, 1]`.
    pub fn pass_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.passes as f64 / self.runs as f64
        }
    }
}

/// Statistics for one namespaced metric across the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Value from the most recent record carrying the metric
    pub latest: f64,
}

/// Bounded run history.
///
/// Appends take a short critical section around push + evict, so readers
/// always see a consistent snapshot.
#[derive(Debug)]
pub struct HistoryLedger {
    capacity: usize,
    records: Mutex<VecDeque<ExecutionRecord>>,
}

impl HistoryLedger {
    /// Create a ledger retaining at most `capacity` records.
    pub fn new(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::invalid_argument(
                "history capacity must be at least 1",
            ));
        }
        Ok(Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ExecutionRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Maximum number of records retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Journal a run and return the stored record.
    pub fn record(&self, outcome: RunOutcome, context: RunContext) -> ExecutionRecord {
        let record = ExecutionRecord {
            run_id: Uuid::new_v4(),
            executed_at: Utc::now(),
            outcome,
            build_identifier: context.build_identifier,
            environment: context.environment,
            system_info: context.system_info,
        };
        self.append(record.clone());
        record
    }

    /// Append a prepared record, evicting the oldest beyond capacity.
    /// Returns the number of evicted records.
    pub fn append(&self, record: ExecutionRecord) -> usize {
        let mut records = self.lock();
        records.push_back(record);
        let mut evicted = 0;
        while records.len() > self.capacity {
            records.pop_front();
            evicted += 1;
        }
        drop(records);

        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.capacity, "Evicted oldest history records");
        }
        evicted
    }

    /// Snapshot of all records, most recent last.
    pub fn history(&self) -> Vec<ExecutionRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Snapshot of the `limit` most recent records, most recent last.
    pub fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        let records = self.lock();
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<ExecutionRecord> {
        self.lock().back().cloned()
    }

    /// Number of records retained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Fraction of recorded runs that passed, or None when empty.
    pub fn success_rate(&self) -> Option<f64> {
        let records = self.lock();
        if records.is_empty() {
            return None;
        }
        let passed = records.iter().filter(|r| r.outcome.success()).count();
        Some(passed as f64 / records.len() as f64)
    }

    /// Per-gate statistics, ordered by gate name.
    pub fn gate_trends(&self) -> Vec<GateTrend> {
        let records = self.lock();
        let mut trends: BTreeMap<String, (GateTrend, u64)> = BTreeMap::new();

        for record in records.iter() {
            for result in record.outcome.gate_results() {
                let (trend, total_ms) = trends.entry(result.gate_name.clone()).or_insert_with(|| {
                    (
                        GateTrend {
                            gate_name: result.gate_name.clone(),
                            runs: 0,
                            passes: 0,
                            failures: 0,
                            critical_failures: 0,
                            average_execution_time_ms: 0.0,
                        },
                        0,
                    )
                });
                trend.runs += 1;
                if result.success {
                    trend.passes += 1;
                } else {
                    trend.failures += 1;
                }
                if result.is_critical_failure() {
                    trend.critical_failures += 1;
                }
                *total_ms += result.execution_time_ms;
            }
        }

        trends
            .into_values()
            .map(|(mut trend, total_ms)| {
                trend.average_execution_time_ms = total_ms as f64 / trend.runs as f64;
                trend
            })
            .collect()
    }

    /// Statistics for a namespaced metric (`<gateName>_<metricKey>`).
    ///
    /// Non-numeric values are ignored. Returns None when no record carries a
    /// numeric value for the key.
    pub fn metric_trend(&self, key: &str) -> Option<MetricTrend> {
        let records = self.lock();
        let values: Vec<f64> = records
            .iter()
            .filter_map(|record| match &record.outcome {
                RunOutcome::Composite(result) => result.metrics.get(key).and_then(|v| v.as_f64()),
                RunOutcome::SingleGate(result) => result
                    .metrics
                    .iter()
                    .find(|(metric, _)| namespaced_metric(&result.gate_name, metric) == key)
                    .and_then(|(_, v)| v.as_f64()),
            })
            .collect();

        let latest = *values.last()?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = values.iter().sum::<f64>() / values.len() as f64;

        Some(MetricTrend {
            count: values.len(),
            min,
            max,
            average,
            latest,
        })
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            records: Mutex::new(VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY)),
        }
    }
}
