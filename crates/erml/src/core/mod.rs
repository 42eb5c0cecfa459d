//! Core abstractions for diagram processing
//!
//! This module defines the pipeline traits the ER notation plugs into
//! (parser, database, renderer), together with the shared error type,
//! logging setup and lexing helpers.

pub mod chumsky_utils;
mod database;
mod error;
pub mod logging;
mod parser;
mod renderer;
mod types;

pub use database::*;
pub use error::*;
pub use logging::*;
pub use parser::*;
pub use renderer::*;
pub use types::*;
