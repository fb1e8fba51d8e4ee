//! Execution Environment Detection
//!
//! Derives the build identifier, the environment tag, and host information
//! attached to every history record.

use std::collections::{BTreeMap, HashMap};
use std::io::IsTerminal;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Environment variables checked for a build identifier, in order.
pub const DEFAULT_BUILD_ID_VARS: &[&str] = &[
    "GATEKEEPER_BUILD_ID",
    "BUILD_ID",
    "BUILD_NUMBER",
    "GITHUB_RUN_ID",
    "CI_PIPELINE_ID",
];

/// Variables whose presence marks a CI runner.
const CI_SIGNALS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_URL",
    "TF_BUILD",
    "BUILDKITE",
    "CIRCLECI",
    "TEAMCITY_VERSION",
];

/// Explicit opt-in for batch mode outside CI.
const BATCH_SIGNAL: &str = "GATEKEEPER_BATCH";

/// Where a run took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionEnvironment {
    /// Continuous integration runner
    Ci,
    /// Headless invocation outside CI
    Batch,
    /// A developer at a terminal
    Interactive,
}

impl std::fmt::Display for ExecutionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionEnvironment::Ci => write!(f, "ci"),
            ExecutionEnvironment::Batch => write!(f, "batch"),
            ExecutionEnvironment::Interactive => write!(f, "interactive"),
        }
    }
}

/// Metadata captured for one history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub build_identifier: String,
    pub environment: ExecutionEnvironment,
    pub system_info: BTreeMap<String, String>,
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads environment signals through an injectable lookup.
#[derive(Clone)]
pub struct EnvironmentDetector {
    lookup: EnvLookup,
    build_id_vars: Vec<String>,
    interactive_terminal: bool,
}

impl EnvironmentDetector {
    /// Detector backed by the process environment and stdin's terminal state.
    pub fn from_process() -> Self {
        Self {
            lookup: Arc::new(|key| std::env::var(key).ok()),
            build_id_vars: default_build_id_vars(),
            interactive_terminal: std::io::stdin().is_terminal(),
        }
    }

    /// Detector backed by a fixed set of variables.
    pub fn from_vars(vars: HashMap<String, String>, interactive_terminal: bool) -> Self {
        Self {
            lookup: Arc::new(move |key| vars.get(key).cloned()),
            build_id_vars: default_build_id_vars(),
            interactive_terminal,
        }
    }

    /// Override the variables checked for the build identifier.
    pub fn with_build_id_vars(mut self, vars: Vec<String>) -> Self {
        self.build_id_vars = vars;
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str) -> bool {
        self.var(key)
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(false)
    }

    /// First non-empty build variable, else `local-<timestamp>`.
    pub fn build_identifier(&self, now: DateTime<Utc>) -> String {
        self.build_id_vars
            .iter()
            .find_map(|key| self.var(key))
            .unwrap_or_else(|| format!("local-{}", now.format("%Y%m%d-%H%M%S")))
    }

    /// Classify the environment: CI signals first, then batch signals.
    pub fn environment(&self) -> ExecutionEnvironment {
        if CI_SIGNALS.iter().any(|key| self.flag(key)) {
            ExecutionEnvironment::Ci
        } else if self.flag(BATCH_SIGNAL) || !self.interactive_terminal {
            ExecutionEnvironment::Batch
        } else {
            ExecutionEnvironment::Interactive
        }
    }

    /// Host information for audit records.
    pub fn system_info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        info.insert("os".to_string(), std::env::consts::OS.to_string());
        info.insert("arch".to_string(), std::env::consts::ARCH.to_string());
        info.insert("family".to_string(), std::env::consts::FAMILY.to_string());
        if let Ok(cpus) = std::thread::available_parallelism() {
            info.insert("cpu_count".to_string(), cpus.get().to_string());
        }
        if let Some(host) = self.var("HOSTNAME").or_else(|| self.var("COMPUTERNAME")) {
            info.insert("hostname".to_string(), host);
        }
        info.insert(
            "gatekeeper_version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        info
    }

    /// Capture everything a history record needs.
    pub fn capture(&self, now: DateTime<Utc>) -> RunContext {
        RunContext {
            build_identifier: self.build_identifier(now),
            environment: self.environment(),
            system_info: self.system_info(),
        }
    }
}

impl std::fmt::Debug for EnvironmentDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentDetector")
            .field("build_id_vars", &self.build_id_vars)
            .field("interactive_terminal", &self.interactive_terminal)
            .finish()
    }
}

fn default_build_id_vars() -> Vec<String> {
    DEFAULT_BUILD_ID_VARS.iter().map(|v| v.to_string()).collect()
}
