//! Services
//!
//! Business logic services for the gate orchestrator.

pub mod orchestrator;
