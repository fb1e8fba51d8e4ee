//! Gate Registry
//!
//! In-memory mapping from gate name to `Arc<dyn Gate>` with O(1) lookup and
//! deterministic registration-order iteration. The registry holds shared
//! references; the gate itself stays owned by whoever created it.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::gate::Gate;

/// Registry for `Gate` implementations.
#[derive(Default)]
pub struct GateRegistry {
    gates: HashMap<String, Arc<dyn Gate>>,
    /// Insertion order for deterministic iteration and priority tie-breaks.
    order: Vec<String>,
}

impl GateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate, replacing any gate already registered under its name.
    ///
    /// A replacement keeps the original registration slot. Returns the
    /// replaced gate, if any.
    pub fn register(&mut self, gate: Arc<dyn Gate>) -> CoreResult<Option<Arc<dyn Gate>>> {
        let name = gate.name().to_string();
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("gate name must not be empty"));
        }
        if !self.gates.contains_key(&name) {
            self.order.push(name.clone());
        }
        Ok(self.gates.insert(name, gate))
    }

    /// Unregister a gate by name. Returns the removed gate, or None.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Gate>> {
        let removed = self.gates.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Look up a gate by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Gate>> {
        self.gates.get(name).cloned()
    }

    /// Look up a gate by name, failing with `NotFound` when it is not registered.
    pub fn require(&self, name: &str) -> CoreResult<Arc<dyn Gate>> {
        self.get(name)
            .ok_or_else(|| CoreError::not_found(format!("Gate '{}' is not registered", name)))
    }

    /// Check if a gate is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.gates.contains_key(name)
    }

    /// Gate names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of registered gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Snapshot of all gates in registration order.
    ///
    /// The returned vector is detached from the registry, so callers can
    /// iterate it while the registry changes.
    pub fn snapshot(&self) -> Vec<Arc<dyn Gate>> {
        self.order
            .iter()
            .filter_map(|name| self.gates.get(name))
            .cloned()
            .collect()
    }

    /// Snapshot ordered by descending priority, ties in registration order.
    pub fn execution_order(&self) -> Vec<Arc<dyn Gate>> {
        let mut gates = self.snapshot();
        // sort_by_key is stable
        gates.sort_by_key(|gate| Reverse(gate.priority()));
        gates
    }
}

// ============================================================================
// Tests
// ============================================================================
