//! Gatekeeper Core
//!
//! Foundational contract, error types, and registry for the Gatekeeper
//! workspace. This crate has no dependency on the orchestration engine, so
//! gate implementations can depend on it alone.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `gate` - Gate contract (`GateDefinition`, `GateExecutable`, `Gate`, `GateResult`, `GateStatus`)
//! - `registry` - Name-keyed gate registry with registration-order iteration

pub mod error;
pub mod gate;
pub mod registry;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Gate Contract ──────────────────────────────────────────────────────
pub use gate::{Gate, GateDefinition, GateExecutable, GateResult, GateStatus};

// ── Registry ───────────────────────────────────────────────────────────
pub use registry::GateRegistry;
