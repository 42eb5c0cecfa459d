//! Core renderer trait for diagram output
//!
//! This trait defines the interface for rendering diagram data
//! into an output format.

use anyhow::Result;

use super::Database;

/// Core trait for diagram renderers
///
/// This trait represents the rendering layer that converts diagram data
/// into text another tool consumes.
///
/// # Example
/// ```
/// use erml::core::Renderer;
/// use erml::plugins::er::{DotRenderer, ErDatabase};
///
/// let db = ErDatabase::new();
/// let renderer = DotRenderer::new();
/// let output = renderer.render(&db).unwrap();
/// assert!(output.starts_with("graph {"));
/// ```
pub trait Renderer<D: Database>: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render the diagram database into the output format
    fn render(&self, database: &D) -> Result<Self::Output>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the version of this renderer
    fn version(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
