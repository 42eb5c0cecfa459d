//! Graphviz DOT renderer
//!
//! Walks a compiled model and writes one undirected DOT graph. Entities come
//! first, each wrapped in an invisible cluster with its attribute nodes and
//! followed by its subclass edges, then relationships the same way with their
//! endpoint edges.
//!
//! Visual conventions:
//!
//! | Model                      | DOT                                        |
//! |----------------------------|--------------------------------------------|
//! | entity / weak entity       | `box` / `box` with `peripheries=2`         |
//! | relationship / owning      | `diamond` / `diamond` with `peripheries=2` |
//! | attribute                  | `ellipse`                                  |
//! | key attribute              | underlined label (U+0331 under weak keys)  |
//! | computed / list attribute  | `style=dashed` / `peripheries=2`           |
//! | ISA edge                   | `arrowtail=icurve`                         |
//! | disjoint / overlapping     | small circle labelled `d` / `o`            |
//! | total participation        | doubled edge (`color="black:black"`)       |

use anyhow::Result;
use tracing::{debug, span, Level};

use crate::core::{RenderConfig, Renderer};

use super::database::{Attribute, ErDatabase, Relationship, SubclassRelationship};
use super::relationship::MAX_NAMED_ENDPOINTS;

/// Compass points on a relationship node, handed out to named endpoints in
/// this order
const ANCHORS: [&str; MAX_NAMED_ENDPOINTS] = ["w", "e", "s", "n"];

/// Combining macron below, used to underline plain-text labels
const UNDERLINE_MARK: char = '\u{0331}';

/// Statement buffer with the shared cluster/group counter
struct Statements {
    lines: Vec<String>,
    counter: usize,
}

impl Statements {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            counter: 0,
        }
    }

    fn push(&mut self, statement: impl Into<String>) {
        self.lines.push(statement.into());
    }

    /// Take the next counter value
    fn next_id(&mut self) -> usize {
        let id = self.counter;
        self.counter += 1;
        id
    }

    fn into_document(self) -> String {
        format!("graph {{\n{}\n}}", self.lines.join("\n"))
    }
}

/// Renders an [`ErDatabase`] as Graphviz DOT text
pub struct DotRenderer {
    config: RenderConfig,
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the whole model. Never fails on a model produced by the parser.
    pub fn render_database(&self, database: &ErDatabase) -> String {
        let render_span = span!(
            Level::DEBUG,
            "render_dot",
            entities = database.entity_count(),
            relationships = database.relationship_count()
        );
        let _enter = render_span.enter();

        let mut out = Statements::new();
        out.push(format!("overlap={}", self.config.overlap));
        out.push(format!("splines={}", self.config.splines));
        out.push(format!("nodesep={}", self.config.nodesep));
        out.push(format!("K={}", self.config.spring_constant));

        for entity in database.entities() {
            let mut node = vec!["shape=box".to_string(), format!("label=\"{}\"", entity.name)];
            if entity.is_weak {
                node.push("peripheries=2".to_string());
            }
            self.open_cluster(&mut out, &entity.name, &node);
            write_attributes(&mut out, &entity.attributes, &entity.name, entity.is_weak);
            out.push("}");

            for subclass_relationship in &entity.subclass_relationships {
                write_subclass_relationship(&mut out, database, subclass_relationship);
            }
        }

        for relationship in database.relationships() {
            let mut node = vec![
                "shape=diamond".to_string(),
                format!("label=\"{}\"", relationship.name),
            ];
            if relationship.is_owning {
                node.push("peripheries=2".to_string());
            }
            self.open_cluster(&mut out, &relationship.name, &node);
            write_attributes(&mut out, &relationship.attributes, &relationship.name, false);
            out.push("}");
            write_endpoints(&mut out, database, relationship);
        }

        debug!(statements = out.lines.len(), "Rendered DOT graph");
        out.into_document()
    }

    fn open_cluster(&self, out: &mut Statements, name: &str, node: &[String]) {
        let id = out.next_id();
        out.push(format!("subgraph cluster{} {{", id));
        out.push("style=invis");
        out.push(format!("K={}", self.config.cluster_spring_constant));
        out.push(format!("\"{}\" [{}]", name, node.join(",")));
    }
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer<ErDatabase> for DotRenderer {
    type Output = String;

    fn render(&self, database: &ErDatabase) -> Result<Self::Output> {
        Ok(self.render_database(database))
    }

    fn name(&self) -> &'static str {
        "dot"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn format(&self) -> &'static str {
        "dot"
    }
}

fn key_label(name: &str, is_weak: bool) -> String {
    if is_weak {
        let underlined: String = name.chars().flat_map(|c| [c, UNDERLINE_MARK]).collect();
        format!("label=\"{}\"", underlined)
    } else {
        format!("label=<<u>{}</u>>", name)
    }
}

/// Attribute nodes and their edges to `parent`. Components are written
/// before the composite node that holds them.
fn write_attributes(out: &mut Statements, attributes: &[Attribute], parent: &str, is_weak: bool) {
    for attribute in attributes {
        let node_name = format!("{}.{}", parent, attribute.name);
        let mut node = vec!["shape=ellipse".to_string()];
        if attribute.is_key {
            node.push(key_label(&attribute.name, is_weak));
        } else {
            node.push(format!("label=\"{}\"", attribute.name));
        }
        if attribute.is_computed {
            node.push("style=dashed".to_string());
        }
        if attribute.is_list {
            node.push("peripheries=2".to_string());
        }

        write_attributes(out, attribute.components(), &node_name, is_weak);
        out.push(format!("\"{}\" [{}]", node_name, node.join(",")));
        out.push(format!("\"{}\" -- \"{}\"", parent, node_name));
    }
}

fn write_subclass_relationship(
    out: &mut Statements,
    database: &ErDatabase,
    relationship: &SubclassRelationship,
) {
    let superclass = database.entity_name(relationship.superclass());
    match relationship {
        SubclassRelationship::Direct { subclass, .. } => {
            out.push(format!(
                "\"{}\" -- \"{}\" [arrowtail=icurve, dir=back]",
                superclass,
                database.entity_name(*subclass)
            ));
        }
        SubclassRelationship::Grouped {
            subclasses,
            is_disjoint,
            is_optional,
            ..
        } => {
            let id = out.next_id();
            let marker = if *is_disjoint { 'd' } else { 'o' };
            out.push(format!(
                "\".{}\" [shape=circle,fixedsize=true,width=0.3,height=0.3,label={}]",
                id, marker
            ));
            for subclass in subclasses {
                let name = database.entity_name(*subclass);
                out.push(format!("\"{}\"", name));
                out.push(format!(
                    "\".{}\" -- \"{}\" [arrowtail=icurve, dir=back]",
                    id, name
                ));
            }
            out.push(format!("\"{}\"", superclass));
            let mut edge = format!("\"{}\" -- \".{}\"", superclass, id);
            if !is_optional {
                edge.push_str(" [color=\"black:black\"]");
            }
            out.push(edge);
        }
    }
}

fn write_endpoints(out: &mut Statements, database: &ErDatabase, relationship: &Relationship) {
    let mut anchors = ANCHORS.into_iter();
    for endpoint in &relationship.endpoints {
        let entity = database.entity_name(endpoint.entity);
        let mut edge = vec![format!("taillabel=\"{}\"", endpoint.cardinality)];
        if !endpoint.is_partial || endpoint.is_owning {
            edge.push("color=\"black:black\"".to_string());
        }

        let source = match &endpoint.name {
            Some(role) => {
                edge.push(format!("label=\"{}\"", role));
                // The parser caps named endpoints at the anchor count
                match anchors.next() {
                    Some(anchor) => format!("\"{}\":{}", relationship.name, anchor),
                    None => format!("\"{}\"", relationship.name),
                }
            }
            None => format!("\"{}\"", relationship.name),
        };
        out.push(format!("{} -- \"{}\" [{}]", source, entity, edge.join(",")));
    }
}
