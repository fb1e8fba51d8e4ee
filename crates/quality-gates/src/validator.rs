//! Configuration Validator
//!
//! Pre-run checks over the registered gate set. Gates that reject their own
//! configuration make the run invalid; suspicious metadata only produces
//! warnings.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use gatekeeper_core::Gate;
use serde::{Deserialize, Serialize};

use crate::models::panic_message;

/// Warning emitted when nothing is registered.
pub const NO_GATES_WARNING: &str = "No gates registered";

/// Bounds used for the non-fatal metadata checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Lowest priority considered reasonable
    pub min_priority: i32,
    /// Highest priority considered reasonable
    pub max_priority: i32,
    /// Expected execution time above which a gate is flagged
    pub max_expected_execution_secs: u64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_priority: 0,
            max_priority: 1000,
            max_expected_execution_secs: 600,
        }
    }
}

/// Outcome of validating the gate set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValidationResult {
    /// False when at least one issue was found
    pub is_valid: bool,
    /// Problems that block a run
    pub issues: Vec<String>,
    /// Suspicious metadata that does not block a run
    pub warnings: Vec<String>,
}

/// Validates a snapshot of registered gates.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationValidator {
    rules: ValidationRules,
}

impl ConfigurationValidator {
    /// Create a validator with the given rules.
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// Rules in effect.
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validate every gate in `gates`.
    pub fn validate(&self, gates: &[Arc<dyn Gate>]) -> ConfigValidationResult {
        let mut result = ConfigValidationResult {
            is_valid: true,
            ..Default::default()
        };

        if gates.is_empty() {
            result.warnings.push(NO_GATES_WARNING.to_string());
            return result;
        }

        let max_expected = Duration::from_secs(self.rules.max_expected_execution_secs);
        let mut critical_by_priority: BTreeMap<i32, Vec<&str>> = BTreeMap::new();

        for gate in gates {
            let name = gate.name();

            match panic::catch_unwind(AssertUnwindSafe(|| gate.validate_configuration())) {
                Ok(true) => {}
                Ok(false) => result
                    .issues
                    .push(format!("Gate '{}' reported an invalid configuration", name)),
                Err(payload) => result.issues.push(format!(
                    "Gate '{}' panicked during configuration validation: {}",
                    name,
                    panic_message(payload.as_ref())
                )),
            }

            let priority = gate.priority();
            if priority < self.rules.min_priority || priority > self.rules.max_priority {
                result.warnings.push(format!(
                    "Gate '{}' has priority {} outside the expected range [{}, {}]",
                    name, priority, self.rules.min_priority, self.rules.max_priority
                ));
            }

            let expected = gate.expected_execution_time();
            if expected > max_expected {
                result.warnings.push(format!(
                    "Gate '{}' expects {}s of execution time, above the {}s limit",
                    name,
                    expected.as_secs(),
                    max_expected.as_secs()
                ));
            }

            if gate.is_critical() {
                critical_by_priority.entry(priority).or_default().push(name);
            }
        }

        for (priority, names) in critical_by_priority {
            if names.len() > 1 {
                let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
                result.warnings.push(format!(
                    "Critical gates {} share priority {}",
                    quoted.join(", "),
                    priority
                ));
            }
        }

        result.is_valid = result.issues.is_empty();

        if result.is_valid {
            tracing::debug!(
                gates = gates.len(),
                warnings = result.warnings.len(),
                "Gate configuration valid"
            );
        } else {
            tracing::warn!(
                issues = result.issues.len(),
                "Gate configuration invalid: {}",
                result.issues.join("; ")
            );
        }

        result
    }
}
