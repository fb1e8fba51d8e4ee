//! Utilities
//!
//! Error type and tracing setup shared by the root crate.

pub mod error;
pub mod logging;

pub use error::*;
pub use logging::init_tracing;
