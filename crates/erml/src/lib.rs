//! erml - Compile a compact ER notation into Graphviz DOT
//!
//! A library for parsing an indentation-based entity-relationship notation
//! into a validated model and rendering that model as an undirected DOT graph.
//!
//! # Quick Start
//!
//! ```rust
//! use erml::render;
//!
//! let input = "Person: [id] name\nCar: [plate]\n<Owns>: -1>Person =N>Car";
//! let dot = render(input).unwrap();
//! assert!(dot.starts_with("graph {"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual components:
//!
//! ```rust
//! use erml::prelude::*;
//!
//! let input = "Vehicle: [vin]\n  Car: doors\n  Truck: payload";
//!
//! // Parse into a database
//! let parser = ErParser::new();
//! let mut database = ErDatabase::new();
//! parser.parse(input, &mut database).unwrap();
//!
//! // Access the parsed data
//! assert_eq!(database.node_count(), 3);
//! let vehicle = database.get_entity("Vehicle").unwrap();
//! assert_eq!(vehicle.subclass_relationships.len(), 2);
//!
//! // Render to DOT
//! let renderer = DotRenderer::new();
//! let dot = renderer.render(&database).unwrap();
//! ```
//!
//! # Notation
//!
//! ```text
//! Person: [ssn] name{first last} <age> phones[]
//!   Student: gpa
//!   Employee: salary
//!   Student|Employee
//! Department: [code]
//! + title
//! <WorksIn>: =N>Employee -1>Department since
//! ```
//!
//! - `Name: attributes` declares an entity, `<Name>: parameters` a relationship
//! - `[key]`, `<computed>`, `list[]` and `composite{parts}` mark attributes
//! - entities indented under an entity are its subclasses; a final plain line
//!   groups them (`^` disjoint, `|` overlapping)
//! - `[Other]` inside a block pulls an entity declared elsewhere into the block
//! - `+ more` continues the previous line
//! - endpoints are `<marker><cardinality>[(role)]>Entity` where `-` is partial
//!   and `*` is owning participation

pub mod core;
pub mod plugins;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{Database, DiagramError, Parser, RenderConfig, Renderer};
    pub use crate::plugins::er::{
        Attribute, AttributeKind, DotRenderer, Endpoint, Entity, EntityId, ErDatabase, ErParser,
        Relationship, RelationshipId, SubclassRelationship,
    };
    pub use crate::plugins::orchestrator::Orchestrator;
}

/// Compile ER notation and render it as Graphviz DOT
///
/// This is the simplest way to go from notation to a diagram description.
/// Uses the default layout hints.
///
/// # Returns
/// * `Ok(String)` - The DOT document
/// * `Err` - A [`DiagramError`] describing the first violation
///
/// # Example
/// ```rust
/// use erml::render;
///
/// let dot = render("Person: [id] name").unwrap();
/// assert!(dot.contains("\"Person.name\""));
/// ```
pub fn render(input: &str) -> anyhow::Result<String> {
    render_with_config(input, RenderConfig::default())
}

/// Compile ER notation and render it with custom layout hints
///
/// # Example
/// ```rust
/// use erml::{render_with_config, RenderConfig};
///
/// let config = RenderConfig::default().with_overlap(true).with_nodesep(1.0);
/// let dot = render_with_config("Person: [id]", config).unwrap();
/// assert!(dot.contains("overlap=true"));
/// assert!(dot.contains("nodesep=1"));
/// ```
pub fn render_with_config(input: &str, config: RenderConfig) -> anyhow::Result<String> {
    use crate::plugins::orchestrator::Orchestrator;

    Orchestrator::with_config(config).process(input)
}

/// Compile ER notation into a database without rendering
///
/// Useful when you need to inspect the compiled model.
///
/// # Example
/// ```rust
/// use erml::parse;
/// use erml::prelude::Database;
///
/// let db = parse("A: x\nB: y\n<R>: =1>A -N>B").unwrap();
/// assert_eq!(db.node_count(), 2);
/// assert_eq!(db.edge_count(), 1);
/// ```
pub fn parse(input: &str) -> anyhow::Result<plugins::er::ErDatabase> {
    use crate::core::Parser as _;
    use crate::plugins::er::{ErDatabase, ErParser};

    let parser = ErParser::new();
    let mut database = ErDatabase::new();
    parser.parse(input, &mut database)?;
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let output = render("Person: [id] name").unwrap();
        assert!(output.starts_with("graph {\n"));
        assert!(output.contains("label=<<u>id</u>>"));
    }

    #[test]
    fn test_render_with_config() {
        let config = RenderConfig::default().with_splines(false);
        let output = render_with_config("A: x", config).unwrap();
        assert!(output.contains("\nsplines=false\n"));
    }

    #[test]
    fn test_parse() {
        let db = parse("A: x\n  B:").unwrap();
        assert_eq!(db.entity_count(), 2);
        assert_eq!(db.relationship_count(), 0);
    }

    #[test]
    fn test_parse_error() {
        let err = parse("  A: x").unwrap_err();
        assert!(err.to_string().contains("cannot have whitespace"));
    }

    #[test]
    fn test_render_error() {
        assert!(render("A: x\n<R>: =1>Ghost").is_err());
    }
}
