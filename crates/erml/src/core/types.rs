//! Shared configuration types

use serde::Serialize;

/// Global layout hints written at the top of every emitted graph.
///
/// The defaults suit spring-model layouts (`neato`, `fdp`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderConfig {
    /// Whether the layout engine may let nodes overlap
    pub overlap: bool,
    /// Whether edges are drawn as splines
    pub splines: bool,
    /// Minimum separation between nodes, in inches
    pub nodesep: f64,
    /// Spring constant for the whole graph (`K`)
    pub spring_constant: f64,
    /// Spring constant inside each entity or relationship cluster
    pub cluster_spring_constant: f64,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlap(mut self, overlap: bool) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_splines(mut self, splines: bool) -> Self {
        self.splines = splines;
        self
    }

    pub fn with_nodesep(mut self, nodesep: f64) -> Self {
        self.nodesep = nodesep;
        self
    }

    pub fn with_spring_constant(mut self, k: f64) -> Self {
        self.spring_constant = k;
        self
    }

    pub fn with_cluster_spring_constant(mut self, k: f64) -> Self {
        self.cluster_spring_constant = k;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overlap: false,
            splines: true,
            nodesep: 0.5,
            spring_constant: 0.2,
            cluster_spring_constant: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert!(!config.overlap);
        assert!(config.splines);
        assert_eq!(config.nodesep, 0.5);
        assert_eq!(config.spring_constant, 0.2);
        assert_eq!(config.cluster_spring_constant, 0.05);
    }

    #[test]
    fn test_builder_setters() {
        let config = RenderConfig::new()
            .with_overlap(true)
            .with_splines(false)
            .with_nodesep(1.25)
            .with_spring_constant(0.4)
            .with_cluster_spring_constant(0.1);
        assert!(config.overlap);
        assert!(!config.splines);
        assert_eq!(config.nodesep, 1.25);
        assert_eq!(config.spring_constant, 0.4);
        assert_eq!(config.cluster_spring_constant, 0.1);
    }
}
