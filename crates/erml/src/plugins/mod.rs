//! Plugin implementations
//!
//! The ER plugin implements the core traits for the ER notation; the
//! orchestrator runs it end to end.

pub mod er;
pub mod orchestrator;

pub use er::*;
pub use orchestrator::*;
