//! Storage Layer
//!
//! Orchestrator configuration loaded from TOML files.

pub mod config;

pub use config::*;
