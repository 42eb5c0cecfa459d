//! ER notation plugin
//!
//! Compiles the indentation-based ER notation into an [`ErDatabase`] and
//! renders it as Graphviz DOT.

mod attribute;
mod database;
mod parser;
mod relationship;
mod renderer;
mod source;
mod structure;
mod subclass;

pub use database::{
    Attribute, AttributeKind, Endpoint, Entity, EntityId, ErDatabase, Relationship,
    RelationshipId, SubclassRelationship,
};
pub use parser::ErParser;
pub use relationship::MAX_NAMED_ENDPOINTS;
pub use renderer::DotRenderer;
