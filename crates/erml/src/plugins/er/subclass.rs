//! Subclass definition lines
//!
//! The last line of an entity's block may name how its nested entities
//! specialize it. Each whitespace-separated token is one group:
//!
//! - `Car` makes `Car` a direct subclass
//! - `Car^Truck` is a disjoint group
//! - `Car|Truck` is an overlapping group
//! - naming the superclass inside a group (`Vehicle^Car^Truck` under
//!   `Vehicle`) makes the group optional
//!
//! Members must come from the block's candidate pool and leave it once used.

use indexmap::IndexSet;
use tracing::trace;

use crate::core::DiagramError;

use super::database::{EntityId, ErDatabase, SubclassRelationship};
use super::structure::SegmentLines;

const DISJOINT: char = '^';
const OVERLAPPING: char = '|';

/// Parse one subclass-definition line for `superclass`.
///
/// `pool` holds the candidates of the enclosing block; every consumed member
/// is removed from it.
pub(crate) fn parse_subclasses(
    superclass: EntityId,
    content: &str,
    lines: SegmentLines<'_>,
    database: &ErDatabase,
    pool: &mut IndexSet<EntityId>,
) -> Result<Vec<SubclassRelationship>, DiagramError> {
    let mut relationships = Vec::new();
    for (segment, text) in content.split('\n').enumerate() {
        let line = lines.line(segment);
        for token in text.split(' ').filter(|t| !t.is_empty()) {
            if let Some(relationship) = parse_group(superclass, token, line, database, pool)? {
                trace!(line, token, "Parsed subclass group");
                relationships.push(relationship);
            }
        }
    }
    Ok(relationships)
}

fn parse_group(
    superclass: EntityId,
    token: &str,
    line: usize,
    database: &ErDatabase,
    pool: &mut IndexSet<EntityId>,
) -> Result<Option<SubclassRelationship>, DiagramError> {
    let disjoint = token.contains(DISJOINT);
    if disjoint && token.contains(OVERLAPPING) {
        return Err(invalid(
            line,
            "conflicting subclass definition, '^' and '|' cannot be used together".to_string(),
        ));
    }

    let lookup = |name: &str| {
        database
            .entity_id(name)
            .ok_or_else(|| invalid(line, format!("entity '{}' does not exist", name)))
    };
    let out_of_scope =
        |name: &str| invalid(line, format!("entity '{}' is not included in this scope", name));

    if !disjoint && !token.contains(OVERLAPPING) {
        let subclass = lookup(token)?;
        if !pool.shift_remove(&subclass) {
            return Err(out_of_scope(token));
        }
        return Ok(Some(SubclassRelationship::Direct {
            superclass,
            subclass,
        }));
    }

    let connector = if disjoint { DISJOINT } else { OVERLAPPING };
    let mut members: IndexSet<EntityId> = IndexSet::new();
    let mut is_optional = false;
    for name in token.split(connector) {
        let entity = lookup(name)?;
        if entity == superclass {
            is_optional = true;
            continue;
        }
        if members.contains(&entity) {
            continue;
        }
        if !pool.contains(&entity) {
            return Err(out_of_scope(name));
        }
        members.insert(entity);
    }

    if members.is_empty() {
        return Ok(None);
    }
    for member in &members {
        pool.shift_remove(member);
    }
    Ok(Some(SubclassRelationship::Grouped {
        superclass,
        subclasses: members.into_iter().collect(),
        is_disjoint: disjoint,
        is_optional,
    }))
}

fn invalid(line: usize, message: String) -> DiagramError {
    DiagramError::parse_error(format!("Line {}: {}", line, message), line)
}
