//! Core parser trait for diagram markup
//!
//! This trait defines the interface for parsing diagram markup language
//! into structured data that can be stored in a database.

use anyhow::Result;

use super::Database;

/// Core trait for diagram parsers
///
/// This trait represents the parsing layer that converts diagram markup
/// into structured data.
///
/// # Example
/// ```
/// use erml::core::{Database, Parser};
/// use erml::plugins::er::{ErDatabase, ErParser};
///
/// let parser = ErParser::new();
/// let mut db = ErDatabase::new();
/// parser.parse("Person: [id] name", &mut db).unwrap();
/// assert_eq!(db.node_count(), 1);
/// ```
pub trait Parser<D: Database>: Send + Sync {
    /// Parse diagram markup into the provided database
    fn parse(&self, input: &str, database: &mut D) -> Result<()>;

    /// Get the name of this parser
    fn name(&self) -> &'static str;

    /// Get the version of this parser
    fn version(&self) -> &'static str;
}
