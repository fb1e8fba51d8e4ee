//! Failure Thresholds
//!
//! Numeric budgets that gates consult when deciding pass or fail. The
//! orchestrator stores and hands them out; it never evaluates them itself.

use std::collections::BTreeMap;

use gatekeeper_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Failure thresholds shared with every gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfiguration {
    /// Minimum acceptable frames per second
    pub min_fps: f64,
    /// Maximum acceptable frame time in milliseconds
    pub max_frame_time_ms: f64,
    /// Maximum acceptable memory use in megabytes
    pub max_memory_mb: f64,
    /// Maximum acceptable build time in seconds
    pub max_build_time_secs: f64,
    /// Maximum acceptable test time in seconds
    pub max_test_time_secs: f64,
    /// Whether gates should treat warnings as failures
    pub fail_on_warnings: bool,
    /// Arbitrary named budgets
    pub custom: BTreeMap<String, f64>,
}

impl Default for ThresholdConfiguration {
    fn default() -> Self {
        Self {
            min_fps: 30.0,
            max_frame_time_ms: 33.3,
            max_memory_mb: 512.0,
            max_build_time_secs: 600.0,
            max_test_time_secs: 300.0,
            fail_on_warnings: false,
            custom: BTreeMap::new(),
        }
    }
}

impl ThresholdConfiguration {
    /// Set minimum FPS
    pub fn with_min_fps(mut self, fps: f64) -> Self {
        self.min_fps = fps;
        self
    }

    /// Set maximum frame time
    pub fn with_max_frame_time_ms(mut self, ms: f64) -> Self {
        self.max_frame_time_ms = ms;
        self
    }

    /// Set maximum memory
    pub fn with_max_memory_mb(mut self, mb: f64) -> Self {
        self.max_memory_mb = mb;
        self
    }

    /// Set maximum build time
    pub fn with_max_build_time_secs(mut self, secs: f64) -> Self {
        self.max_build_time_secs = secs;
        self
    }

    /// Set maximum test time
    pub fn with_max_test_time_secs(mut self, secs: f64) -> Self {
        self.max_test_time_secs = secs;
        self
    }

    /// Set fail-on-warnings
    pub fn fail_on_warnings(mut self, enabled: bool) -> Self {
        self.fail_on_warnings = enabled;
        self
    }

    /// Add or replace a custom threshold
    pub fn with_custom(mut self, key: impl Into<String>, value: f64) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    /// Look up a custom threshold.
    pub fn custom_threshold(&self, key: &str) -> Option<f64> {
        self.custom.get(key).copied()
    }

    /// Reject negative or non-finite named budgets and non-finite custom values.
    ///
    /// Custom thresholds may be negative (deltas, allowed regressions).
    pub fn validate(&self) -> CoreResult<()> {
        let named = [
            ("min_fps", self.min_fps),
            ("max_frame_time_ms", self.max_frame_time_ms),
            ("max_memory_mb", self.max_memory_mb),
            ("max_build_time_secs", self.max_build_time_secs),
            ("max_test_time_secs", self.max_test_time_secs),
        ];

        for (key, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::invalid_argument(format!(
                    "threshold '{}' must be a finite, non-negative number (got {})",
                    key, value
                )));
            }
        }
        for (key, value) in &self.custom {
            if !value.is_finite() {
                return Err(CoreError::invalid_argument(format!(
                    "custom threshold '{}' must be a finite number (got {})",
                    key, value
                )));
            }
        }
        Ok(())
    }
}
