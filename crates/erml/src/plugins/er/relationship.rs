//! Relationship parameter lists
//!
//! A relationship line holds whitespace-separated tokens. Tokens containing
//! `>` are endpoints, everything else is a plain attribute name:
//!
//! ```text
//! <Manages>: -1(manager)>Employee -N(report)>Employee since
//! ```
//!
//! Endpoint grammar: a participation marker (`-` partial, `*` owning, any
//! other character total), a cardinality (`1` or an ASCII letter), an optional
//! `(role)` label, then `>` and the entity name. The marker may be left out
//! entirely (`N>Employee`), which means total participation.

use std::collections::HashSet;

use chumsky::prelude::*;
use tracing::trace;

use crate::core::chumsky_utils::is_identifier;
use crate::core::DiagramError;

use super::database::{Attribute, Endpoint, EntityId, ErDatabase};
use super::structure::SegmentLines;

/// Most endpoints one relationship may label with a role name. Each labelled
/// endpoint is drawn from its own compass anchor on the relationship node.
pub const MAX_NAMED_ENDPOINTS: usize = 4;

/// Endpoint token split into its parts, before any validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawEndpoint<'src> {
    marker: Option<char>,
    cardinality: char,
    /// Text between the cardinality and `>`, parentheses included
    label: &'src str,
    entity: &'src str,
}

fn endpoint_grammar<'src>() -> impl chumsky::Parser<'src, &'src str, RawEndpoint<'src>> + Clone {
    let marked = any()
        .then(none_of("(>"))
        .map(|(marker, cardinality)| (Some(marker), cardinality));
    let bare = none_of("(>").map(|cardinality| (None, cardinality));

    marked
        .or(bare)
        .then(none_of('>').repeated().to_slice())
        .then_ignore(just('>'))
        .then(any().repeated().to_slice())
        .then_ignore(end())
        .map(|(((marker, cardinality), label), entity)| RawEndpoint {
            marker,
            cardinality,
            label,
            entity,
        })
}

fn is_cardinality(c: char) -> bool {
    c == '1' || c.is_ascii_alphabetic()
}

/// Parsed attributes and endpoints of one relationship
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RelationshipBody {
    pub attributes: Vec<Attribute>,
    pub endpoints: Vec<Endpoint>,
}

/// Parse the parameter list of relationship `name`.
///
/// Endpoint entities are resolved against `database`, so every entity must
/// already be registered (though not necessarily populated).
pub(crate) fn parse_relationship(
    name: &str,
    content: &str,
    lines: SegmentLines<'_>,
    database: &ErDatabase,
) -> Result<RelationshipBody, DiagramError> {
    let mut state = RelationshipParser {
        name,
        database,
        body: RelationshipBody::default(),
        attribute_names: HashSet::new(),
        endpoint_entities: HashSet::new(),
        cardinalities: HashSet::new(),
    };

    for (segment, text) in content.split('\n').enumerate() {
        let line = lines.line(segment);
        for token in text.split(' ').filter(|t| !t.is_empty()) {
            if token.contains('>') {
                state.endpoint(token, line)?;
            } else {
                state.attribute(token, line)?;
            }
        }
    }

    Ok(state.body)
}

struct RelationshipParser<'a> {
    name: &'a str,
    database: &'a ErDatabase,
    body: RelationshipBody,
    attribute_names: HashSet<&'a str>,
    endpoint_entities: HashSet<EntityId>,
    /// Letters used so far; `1` is never recorded
    cardinalities: HashSet<char>,
}

impl<'a> RelationshipParser<'a> {
    fn attribute(&mut self, token: &'a str, line: usize) -> Result<(), DiagramError> {
        if !is_identifier(token) {
            return Err(invalid(
                line,
                format!(
                    "invalid attribute name '{}', should only contain alphanumeric characters, underscores and dashes",
                    token
                ),
            ));
        }
        if !self.attribute_names.insert(token) {
            return Err(invalid(
                line,
                format!("attribute '{}' is already defined", token),
            ));
        }
        self.body.attributes.push(Attribute::simple(token));
        Ok(())
    }

    fn endpoint(&mut self, token: &str, line: usize) -> Result<(), DiagramError> {
        let raw = endpoint_grammar()
            .parse(token)
            .into_result()
            .map_err(|_| invalid(line, format!("malformed endpoint '{}'", token)))?;
        trace!(line, ?raw, "Lexed endpoint");

        let cardinality = raw.cardinality;
        if !is_cardinality(cardinality) {
            return Err(invalid(
                line,
                format!("invalid endpoint cardinality '{}'", cardinality),
            ));
        }
        if cardinality != '1' && !self.cardinalities.insert(cardinality) {
            return Err(invalid(
                line,
                format!("cardinality '{}' is already defined", cardinality),
            ));
        }

        let role = if raw.label.is_empty() {
            None
        } else {
            let Some(role) = raw.label.strip_prefix('(').and_then(|s| s.strip_suffix(')')) else {
                return Err(invalid(
                    line,
                    format!(
                        "invalid endpoint name '{}', should be surrounded by parentheses",
                        raw.label
                    ),
                ));
            };
            if !is_identifier(role) {
                return Err(invalid(
                    line,
                    format!(
                        "invalid endpoint name '{}', should only contain alphanumeric characters, underscores and dashes",
                        role
                    ),
                ));
            }
            Some(role.to_string())
        };

        let Some(entity) = self.database.entity_id(raw.entity) else {
            return Err(invalid(
                line,
                format!("entity '{}' does not exist", raw.entity),
            ));
        };
        if !self.endpoint_entities.insert(entity) {
            return Err(invalid(
                line,
                format!("entity '{}' is already an endpoint", raw.entity),
            ));
        }

        if role.is_some() {
            let named = self
                .body
                .endpoints
                .iter()
                .filter(|e| e.name.is_some())
                .count();
            if named == MAX_NAMED_ENDPOINTS {
                return Err(invalid(
                    line,
                    format!(
                        "relationship '{}' has more than {} named endpoints",
                        self.name, MAX_NAMED_ENDPOINTS
                    ),
                ));
            }
        }

        self.body.endpoints.push(Endpoint {
            name: role,
            entity,
            is_partial: raw.marker == Some('-'),
            cardinality,
            is_owning: raw.marker == Some('*'),
        });
        Ok(())
    }
}

fn invalid(line: usize, message: String) -> DiagramError {
    DiagramError::parse_error(format!("Line {}: {}", line, message), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::er::database::Entity;

    fn database(names: &[&str]) -> ErDatabase {
        let mut db = ErDatabase::new();
        for (index, name) in names.iter().enumerate() {
            db.add_entity(Entity::new(*name, index + 1)).unwrap();
        }
        db
    }

    fn parse(content: &str, db: &ErDatabase) -> Result<RelationshipBody, DiagramError> {
        let numbers: Vec<usize> = (1..=content.matches('\n').count() + 1).collect();
        parse_relationship("R", content, SegmentLines::new(&numbers), db)
    }

    fn message(content: &str, db: &ErDatabase) -> String {
        match parse(content, db).unwrap_err() {
            DiagramError::ParseError { message, .. } => message,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_grammar() {
        let lexed = endpoint_grammar().parse("-N(boss)>Employee").into_output().unwrap();
        assert_eq!(lexed.marker, Some('-'));
        assert_eq!(lexed.cardinality, 'N');
        assert_eq!(lexed.label, "(boss)");
        assert_eq!(lexed.entity, "Employee");

        let bare = endpoint_grammar().parse("1>Dept").into_output().unwrap();
        assert_eq!(bare.marker, None);
        assert_eq!(bare.cardinality, '1');
        assert_eq!(bare.label, "");

        let bare_named = endpoint_grammar().parse("M(x)>Dept").into_output().unwrap();
        assert_eq!(bare_named.marker, None);
        assert_eq!(bare_named.label, "(x)");

        assert!(endpoint_grammar().parse(">Dept").into_result().is_err());
    }

    #[test]
    fn test_participation_markers() {
        let db = database(&["A", "B", "C"]);
        let body = parse("-1>A *N>B =M>C", &db).unwrap();
        let a = &body.endpoints[0];
        assert!(a.is_partial && !a.is_owning);
        let b = &body.endpoints[1];
        assert!(!b.is_partial && b.is_owning);
        let c = &body.endpoints[2];
        assert!(!c.is_partial && !c.is_owning);
        assert_eq!(c.cardinality, 'M');
    }

    #[test]
    fn test_attributes_and_endpoints_mix() {
        let db = database(&["Student", "Course"]);
        let body = parse("=N>Student grade\n=M>Course semester", &db).unwrap();
        assert_eq!(body.endpoints.len(), 2);
        let names: Vec<_> = body.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["grade", "semester"]);
        assert!(body.attributes.iter().all(|a| !a.is_key && !a.is_composite()));
    }

    #[test]
    fn test_unary_relationship_roles() {
        let db = database(&["Employee"]);
        let body = parse("-1(manager)>Employee", &db).unwrap();
        assert_eq!(body.endpoints[0].name.as_deref(), Some("manager"));

        assert_eq!(
            message("-1(manager)>Employee -N(report)>Employee", &db),
            "Line 1: entity 'Employee' is already an endpoint"
        );
    }

    #[test]
    fn test_cardinality_rules() {
        let db = database(&["A", "B", "C"]);
        assert!(parse("=1>A =1>B", &db).is_ok());
        assert_eq!(
            message("=N>A =N>B", &db),
            "Line 1: cardinality 'N' is already defined"
        );
        assert_eq!(
            message("=2>A", &db),
            "Line 1: invalid endpoint cardinality '2'"
        );
    }

    #[test]
    fn test_endpoint_name_rules() {
        let db = database(&["A"]);
        assert_eq!(
            message("=1boss>A", &db),
            "Line 1: invalid endpoint name 'boss', should be surrounded by parentheses"
        );
        assert_eq!(
            message("=1(b.ss)>A", &db),
            "Line 1: invalid endpoint name 'b.ss', should only contain alphanumeric characters, underscores and dashes"
        );
    }

    #[test]
    fn test_unknown_entity() {
        let db = database(&["A"]);
        let err = parse("=1>A\n=N>Ghost", &db).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(
            err.to_string(),
            "Parse error: Line 2: entity 'Ghost' does not exist"
        );
    }

    #[test]
    fn test_attribute_rules() {
        let db = database(&["A"]);
        assert_eq!(
            message("since since", &db),
            "Line 1: attribute 'since' is already defined"
        );
        assert_eq!(
            message("[since]", &db),
            "Line 1: invalid attribute name '[since]', should only contain alphanumeric characters, underscores and dashes"
        );
    }

    #[test]
    fn test_named_endpoint_limit() {
        let db = database(&["A", "B", "C", "D", "E"]);
        assert!(parse("=1(a)>A =1(b)>B =1(c)>C =1(d)>D =1>E", &db).is_ok());
        assert_eq!(
            message("=1(a)>A =1(b)>B =1(c)>C =1(d)>D =1(e)>E", &db),
            "Line 1: relationship 'R' has more than 4 named endpoints"
        );
    }
}
