//! ER notation parser
//!
//! Runs the line passes from [`source`](super::source) and
//! [`structure`](super::structure), registers every declared symbol, then
//! walks the logical lines once to populate the graph.
//!
//! While walking, the assembler keeps one open block per owning line. Each
//! block carries a candidate pool: the entities declared directly inside it
//! plus those pulled in with `[Name]` lines. A subclass-definition line draws
//! its members from that pool, and whatever is left when the block closes
//! becomes a direct subclass of the owning entity.

use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, span, trace, Level};

use crate::core::{DiagramError, Parser};

use super::attribute::parse_attributes;
use super::database::{Entity, EntityId, ErDatabase, Relationship, RelationshipId, SubclassRelationship};
use super::relationship::parse_relationship;
use super::source::{classify_symbols, normalize_lines, LineRecord, LineRole, SymbolKind};
use super::structure::{
    classify_roles, merge_continuations, resolve_indentation, validate_ownership, LogicalLine,
    SegmentLines,
};
use super::subclass::parse_subclasses;

/// ER notation parser
pub struct ErParser;

impl ErParser {
    pub fn new() -> Self {
        Self
    }

    /// Compile `input` into a fresh database.
    ///
    /// Stops at the first violation; no partial graph is returned.
    pub fn parse_model(&self, input: &str) -> Result<ErDatabase, DiagramError> {
        let parse_span = span!(Level::INFO, "parse_er", input_len = input.len());
        let _enter = parse_span.enter();

        let lines = normalize_lines(input);
        let mut records = classify_symbols(&lines)?;
        resolve_indentation(&mut records)?;
        classify_roles(&records)?;
        let logical = merge_continuations(&mut records);
        validate_ownership(&records)?;

        let mut database = ErDatabase::new();
        let symbols = register_symbols(&records, &mut database)?;
        let database = Assembler::new(&records, symbols, database).run(&logical)?;

        info!(
            entities = database.entity_count(),
            relationships = database.relationship_count(),
            "Parsed ER model"
        );
        Ok(database)
    }
}

impl Default for ErParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<ErDatabase> for ErParser {
    /// Replaces the content of `database` with the compiled model. On error
    /// `database` is left untouched.
    fn parse(&self, input: &str, database: &mut ErDatabase) -> Result<()> {
        *database = self.parse_model(input)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "erml"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolId {
    Entity(EntityId),
    Relationship(RelationshipId),
}

/// Declare every symbol up front so relationships and subclass lines can
/// refer to entities declared further down.
fn register_symbols(
    records: &[LineRecord<'_>],
    database: &mut ErDatabase,
) -> Result<Vec<Option<SymbolId>>, DiagramError> {
    let internal = |e: anyhow::Error| DiagramError::internal_error(e.to_string());
    records
        .iter()
        .map(|record| {
            let Some(symbol) = record.symbol else {
                return Ok(None);
            };
            let id = match symbol.kind {
                SymbolKind::Entity => SymbolId::Entity(
                    database
                        .add_entity(Entity::new(symbol.name, record.number))
                        .map_err(internal)?,
                ),
                SymbolKind::Relationship => SymbolId::Relationship(
                    database
                        .add_relationship(Relationship::new(symbol.name, record.number))
                        .map_err(internal)?,
                ),
            };
            Ok(Some(id))
        })
        .collect()
}

/// An open lexical block
#[derive(Debug)]
struct Block {
    /// Owning head record, `None` for the top level
    owner: Option<usize>,
    /// Subclass candidates, in the order they entered the block
    pool: IndexSet<EntityId>,
}

impl Block {
    fn new(owner: Option<usize>) -> Self {
        Self {
            owner,
            pool: IndexSet::new(),
        }
    }
}

struct Assembler<'a, 'src> {
    records: &'a [LineRecord<'src>],
    symbols: Vec<Option<SymbolId>>,
    database: ErDatabase,
    blocks: Vec<Block>,
    /// `[Name]` references to entities not yet populated, with the first
    /// referencing line
    deferred: IndexMap<EntityId, usize>,
}

impl<'a, 'src> Assembler<'a, 'src> {
    fn new(
        records: &'a [LineRecord<'src>],
        symbols: Vec<Option<SymbolId>>,
        database: ErDatabase,
    ) -> Self {
        Self {
            records,
            symbols,
            database,
            blocks: vec![Block::new(None)],
            deferred: IndexMap::new(),
        }
    }

    fn run(mut self, lines: &[LogicalLine<'src>]) -> Result<ErDatabase, DiagramError> {
        let span = span!(Level::DEBUG, "assemble_graph", lines = lines.len());
        let _enter = span.enter();

        for line in lines {
            self.enter_block(line.owner)?;
            trace!(line = line.number(), role = ?line.role, depth = self.blocks.len(), "Assembling line");
            match line.role {
                LineRole::Symbol => self.declaration(line)?,
                LineRole::SubclassDefinition => self.subclass_definition(line)?,
                LineRole::SubclassReference => self.subclass_reference(line)?,
                LineRole::Continuation => {
                    return Err(DiagramError::internal_error(format!(
                        "continuation line {} should have been merged",
                        line.number()
                    )));
                }
            }
        }
        while self.blocks.len() > 1 {
            self.close_block()?;
        }

        debug!(
            entities = self.database.entity_count(),
            relationships = self.database.relationship_count(),
            "Assembled graph"
        );
        Ok(self.database)
    }

    fn current_pool(&mut self) -> &mut IndexSet<EntityId> {
        // The root block is never popped
        let last = self.blocks.len() - 1;
        &mut self.blocks[last].pool
    }

    /// Make the block owned by `owner` the innermost open block, closing
    /// blocks on the way out or opening a new one on the way in.
    fn enter_block(&mut self, owner: Option<usize>) -> Result<(), DiagramError> {
        if !self.blocks.iter().any(|block| block.owner == owner) {
            self.blocks.push(Block::new(owner));
            return Ok(());
        }
        while self.blocks.last().is_some_and(|block| block.owner != owner) {
            self.close_block()?;
        }
        Ok(())
    }

    /// Remaining candidates become direct subclasses of the owning entity.
    fn close_block(&mut self) -> Result<(), DiagramError> {
        let Some(block) = self.blocks.pop() else {
            return Err(DiagramError::internal_error("subclass stack is empty"));
        };
        let Some(owner) = block.owner else {
            return Ok(());
        };
        let superclass = self.entity_at(owner)?;
        trace!(owner = self.records[owner].number, candidates = block.pool.len(), "Closing block");
        let relationships = block.pool.into_iter().map(|subclass| SubclassRelationship::Direct {
            superclass,
            subclass,
        });
        if let Some(entity) = self.database.entity_mut(superclass) {
            entity.subclass_relationships.extend(relationships);
        }
        Ok(())
    }

    fn entity_at(&self, record: usize) -> Result<EntityId, DiagramError> {
        match self.symbols.get(record) {
            Some(Some(SymbolId::Entity(id))) => Ok(*id),
            _ => Err(DiagramError::internal_error(format!(
                "owning entity not found at line {}",
                self.records.get(record).map(|r| r.number).unwrap_or_default()
            ))),
        }
    }

    fn declaration(&mut self, line: &LogicalLine<'src>) -> Result<(), DiagramError> {
        let segments = SegmentLines::new(&line.numbers);
        match self.symbols.get(line.head).copied().flatten() {
            Some(SymbolId::Entity(id)) => {
                self.check_line(self.database.entity(id).map(|e| e.line), line)?;
                let attributes = parse_attributes(&line.content, segments)?;
                if line.owner.is_some() {
                    if let Some(key) = attributes.iter().find_map(|a| a.find_key()) {
                        return Err(key_in_subclass(&key.name, line.number()));
                    }
                }
                self.database.finalize_entity(id, attributes);
                if let Some(reference) = self.deferred.shift_remove(&id) {
                    self.ensure_no_key(id, reference)?;
                }
                self.current_pool().insert(id);
            }
            Some(SymbolId::Relationship(id)) => {
                self.check_line(self.database.relationship(id).map(|r| r.line), line)?;
                let name = line.symbol.map(|s| s.name).unwrap_or_default();
                let body = parse_relationship(name, &line.content, segments, &self.database)?;
                self.database
                    .finalize_relationship(id, body.attributes, body.endpoints);
            }
            None => {
                return Err(DiagramError::internal_error(format!(
                    "symbol not found at line {}",
                    line.number()
                )));
            }
        }
        Ok(())
    }

    /// The registered declaration line must be the line being populated
    fn check_line(&self, registered: Option<usize>, line: &LogicalLine<'src>) -> Result<(), DiagramError> {
        match registered {
            Some(expected) if expected == line.number() => Ok(()),
            expected => Err(DiagramError::internal_error(format!(
                "line numbers do not match up during final parse - expected {}, got {}",
                expected.unwrap_or_default(),
                line.number()
            ))),
        }
    }

    fn subclass_definition(&mut self, line: &LogicalLine<'src>) -> Result<(), DiagramError> {
        let owner = line.owner.ok_or_else(|| {
            DiagramError::internal_error(format!(
                "owning entity not found at line {}",
                line.number()
            ))
        })?;
        let superclass = self.entity_at(owner)?;
        let last = self.blocks.len() - 1;
        let relationships = parse_subclasses(
            superclass,
            &line.content,
            SegmentLines::new(&line.numbers),
            &self.database,
            &mut self.blocks[last].pool,
        )?;
        if let Some(entity) = self.database.entity_mut(superclass) {
            entity.subclass_relationships.extend(relationships);
        }
        Ok(())
    }

    fn subclass_reference(&mut self, line: &LogicalLine<'src>) -> Result<(), DiagramError> {
        let number = line.number();
        let name = line
            .content
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or_default()
            .trim();
        let Some(entity) = self.database.entity_id(name) else {
            return Err(DiagramError::parse_error(
                format!("Line {}: entity {} does not exist", number, name),
                number,
            ));
        };
        if self.database.entity(entity).is_some_and(Entity::is_finalized) {
            self.ensure_no_key(entity, number)?;
        } else {
            self.deferred.entry(entity).or_insert(number);
        }
        self.current_pool().insert(entity);
        Ok(())
    }

    fn ensure_no_key(&self, entity: EntityId, line: usize) -> Result<(), DiagramError> {
        match self.database.entity(entity).and_then(Entity::find_key) {
            Some(key) => Err(key_in_subclass(&key.name, line)),
            None => Ok(()),
        }
    }
}

fn key_in_subclass(attribute: &str, line: usize) -> DiagramError {
    DiagramError::parse_error(
        format!(
            "Attribute '{}' (line {}) cannot be a key attribute because it is in a subclass entity",
            attribute, line
        ),
        line,
    )
}
