//! Storage trait for compiled models

use anyhow::Result;

/// Node/edge store a [`Parser`](super::Parser) fills and a
/// [`Renderer`](super::Renderer) reads.
///
/// For ER models nodes are entities and edges are relationships; both are
/// looked up by their declared name.
pub trait Database: Send + Sync {
    type Node: Clone + Send + Sync;
    type Edge: Clone + Send + Sync;

    /// Store a node. Fails when its name is already taken.
    fn add_node(&mut self, node: Self::Node) -> Result<()>;

    /// Store an edge. Fails when its name is already taken.
    fn add_edge(&mut self, edge: Self::Edge) -> Result<()>;

    fn get_node(&self, name: &str) -> Option<&Self::Node>;

    /// Nodes in insertion order
    fn nodes(&self) -> impl Iterator<Item = &Self::Node>;

    /// Edges in insertion order
    fn edges(&self) -> impl Iterator<Item = &Self::Edge>;

    fn clear(&mut self);

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
