//! Pipeline orchestrator
//!
//! Runs source text through Parser → Database → Renderer.

use anyhow::Result;
use tracing::{debug, info, span, Level};

use crate::core::{Parser, RenderConfig, Renderer};
use crate::plugins::er::{DotRenderer, ErDatabase, ErParser};

/// Wires the ER parser and the DOT renderer together so callers can run the
/// full pipeline without handling each trait manually.
pub struct Orchestrator {
    parser: ErParser,
    renderer: DotRenderer,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    /// Orchestrator whose renderer uses the given layout hints
    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            parser: ErParser::new(),
            renderer: DotRenderer::with_config(config),
        }
    }

    pub fn render_config(&self) -> &RenderConfig {
        self.renderer.config()
    }

    /// Compile `input` and render it as DOT
    pub fn process(&self, input: &str) -> Result<String> {
        let process_span = span!(Level::INFO, "process_diagram", input_len = input.len());
        let _enter = process_span.enter();

        info!("Starting diagram processing pipeline");
        let (_, output) = self.process_with_database(input)?;
        info!("Pipeline completed successfully");
        Ok(output)
    }

    /// Like [`Orchestrator::process`], also handing back the compiled model
    pub fn process_with_database(&self, input: &str) -> Result<(ErDatabase, String)> {
        let parse_span = span!(Level::DEBUG, "pipeline_parse");
        let parse_enter = parse_span.enter();
        let mut database = ErDatabase::new();
        self.parser.parse(input, &mut database)?;
        debug!(
            entity_count = database.entity_count(),
            relationship_count = database.relationship_count(),
            "Parsing completed"
        );
        drop(parse_enter);

        let render_span = span!(Level::DEBUG, "pipeline_render");
        let _render_enter = render_span.enter();
        let output = self.renderer.render(&database)?;
        debug!(output_len = output.len(), "Rendering completed");

        Ok((database, output))
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DiagramError;

    #[test]
    fn test_orchestrator_default_config() {
        let orchestrator = Orchestrator::default();
        assert_eq!(*orchestrator.render_config(), RenderConfig::default());
    }

    #[test]
    fn test_process_simple_model() {
        let orchestrator = Orchestrator::new();
        let output = orchestrator.process("Person: [id] name").unwrap();
        assert!(output.starts_with("graph {\n"));
        assert!(output.ends_with("\n}"));
        assert!(output.contains("\"Person\" [shape=box,label=\"Person\"]"));
    }

    #[test]
    fn test_process_with_database() {
        let orchestrator = Orchestrator::new();
        let (database, output) = orchestrator
            .process_with_database("A: x\nB: y\n<R>: =1>A -N>B")
            .unwrap();
        assert_eq!(database.entity_count(), 2);
        assert_eq!(database.relationship_count(), 1);
        assert!(output.contains("shape=diamond"));
    }

    #[test]
    fn test_process_uses_config() {
        let orchestrator = Orchestrator::with_config(RenderConfig::default().with_nodesep(2.0));
        let output = orchestrator.process("A: x").unwrap();
        assert!(output.contains("\nnodesep=2\n"));
    }

    #[test]
    fn test_process_empty_input() {
        let output = Orchestrator::new().process("").unwrap();
        assert_eq!(output, "graph {\noverlap=false\nsplines=true\nnodesep=0.5\nK=0.2\n}");
    }

    #[test]
    fn test_process_reports_parse_error() {
        let err = Orchestrator::new().process("A: x\nA: y").unwrap_err();
        let diagram_error = err.downcast_ref::<DiagramError>().unwrap();
        assert_eq!(diagram_error.line(), Some(2));
    }
}
