//! ER model database
//!
//! Entities and relationships live in two arenas addressed by [`EntityId`]
//! and [`RelationshipId`]. Every cross reference (endpoint targets, subclass
//! edges) is stored as an id, so the graph has no ownership cycles.
//!
//! Symbols are declared before they are populated: the parser registers every
//! entity and relationship first, then fills each one in when it reaches the
//! declaring line. A declared-but-unpopulated record reports
//! `is_finalized() == false`.

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::core::Database;

/// Index of an entity in its database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a relationship in its database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelationshipId(usize);

impl RelationshipId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether an attribute is atomic or split into components
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "components", rename_all = "snake_case")]
pub enum AttributeKind {
    Simple,
    /// Never empty once produced by the parser
    Composite(Vec<Attribute>),
}

/// An attribute of an entity or relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub is_key: bool,
    pub is_list: bool,
    pub is_computed: bool,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl Attribute {
    /// A plain attribute with no markers
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_key: false,
            is_list: false,
            is_computed: false,
            kind: AttributeKind::Simple,
        }
    }

    pub fn composite(name: impl Into<String>, components: Vec<Attribute>) -> Self {
        Self {
            kind: AttributeKind::Composite(components),
            ..Self::simple(name)
        }
    }

    pub fn with_key(mut self, is_key: bool) -> Self {
        self.is_key = is_key;
        self
    }

    pub fn with_list(mut self, is_list: bool) -> Self {
        self.is_list = is_list;
        self
    }

    pub fn with_computed(mut self, is_computed: bool) -> Self {
        self.is_computed = is_computed;
        self
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, AttributeKind::Composite(_))
    }

    /// Child attributes; empty for simple attributes
    pub fn components(&self) -> &[Attribute] {
        match &self.kind {
            AttributeKind::Simple => &[],
            AttributeKind::Composite(children) => children,
        }
    }

    /// Returns the first key attribute in this subtree, depth first
    pub fn find_key(&self) -> Option<&Attribute> {
        if self.is_key {
            return Some(self);
        }
        self.components().iter().find_map(Attribute::find_key)
    }
}

/// A superclass-to-subclass specialization edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubclassRelationship {
    Direct {
        superclass: EntityId,
        subclass: EntityId,
    },
    Grouped {
        superclass: EntityId,
        subclasses: Vec<EntityId>,
        is_disjoint: bool,
        is_optional: bool,
    },
}

impl SubclassRelationship {
    pub fn superclass(&self) -> EntityId {
        match self {
            Self::Direct { superclass, .. } | Self::Grouped { superclass, .. } => *superclass,
        }
    }

    /// Subclasses in declaration order
    pub fn subclasses(&self) -> &[EntityId] {
        match self {
            Self::Direct { subclass, .. } => std::slice::from_ref(subclass),
            Self::Grouped { subclasses, .. } => subclasses,
        }
    }
}

/// An entity in the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Edges where this entity is the superclass
    pub subclass_relationships: Vec<SubclassRelationship>,
    pub is_weak: bool,
    /// 1-based source line of the declaration
    pub line: usize,
    #[serde(skip)]
    finalized: bool,
}

impl Entity {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            subclass_relationships: Vec::new(),
            is_weak: false,
            line,
            finalized: false,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// First key attribute anywhere in the attribute tree
    pub fn find_key(&self) -> Option<&Attribute> {
        self.attributes.iter().find_map(Attribute::find_key)
    }
}

/// One entity's participation in a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Role name, needed to tell apart the two ends of a unary relationship
    pub name: Option<String>,
    pub entity: EntityId,
    pub is_partial: bool,
    /// `1` or a single ASCII letter
    pub cardinality: char,
    pub is_owning: bool,
}

/// An n-ary relationship between entities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub endpoints: Vec<Endpoint>,
    /// True iff some endpoint owns a weak entity
    pub is_owning: bool,
    /// 1-based source line of the declaration
    pub line: usize,
    #[serde(skip)]
    finalized: bool,
}

impl Relationship {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            endpoints: Vec::new(),
            is_owning: false,
            line,
            finalized: false,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns true if `entity` takes part in this relationship
    pub fn involves(&self, entity: EntityId) -> bool {
        self.endpoints.iter().any(|e| e.entity == entity)
    }
}

/// ER model database
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErDatabase {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    entity_index: HashMap<String, EntityId>,
    #[serde(skip)]
    relationship_index: HashMap<String, RelationshipId>,
}

impl ErDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Entity and relationship names share one namespace.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        self.ensure_unused(&entity.name)?;
        let id = EntityId(self.entities.len());
        self.entity_index.insert(entity.name.clone(), id);
        self.entities.push(entity);
        Ok(id)
    }

    /// Register a relationship. Entity and relationship names share one namespace.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<RelationshipId> {
        self.ensure_unused(&relationship.name)?;
        let id = RelationshipId(self.relationships.len());
        self.relationship_index
            .insert(relationship.name.clone(), id);
        self.relationships.push(relationship);
        Ok(id)
    }

    fn ensure_unused(&self, name: &str) -> Result<()> {
        if self.entity_index.contains_key(name) || self.relationship_index.contains_key(name) {
            bail!("symbol '{}' is already defined", name);
        }
        Ok(())
    }

    /// Entities in declaration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Relationships in declaration order
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id.0)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub(crate) fn relationship_mut(&mut self, id: RelationshipId) -> Option<&mut Relationship> {
        self.relationships.get_mut(id.0)
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entity_index.get(name).copied()
    }

    pub fn relationship_id(&self, name: &str) -> Option<RelationshipId> {
        self.relationship_index.get(name).copied()
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entity_id(name).and_then(|id| self.entity(id))
    }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationship_id(name).and_then(|id| self.relationship(id))
    }

    /// Name of an entity, or an empty string for a dangling id
    pub fn entity_name(&self, id: EntityId) -> &str {
        self.entity(id).map(|e| e.name.as_str()).unwrap_or_default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships `entity` takes part in, in declaration order
    pub fn relationships_involving(
        &self,
        entity: EntityId,
    ) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships
            .iter()
            .filter(move |relationship| relationship.involves(entity))
    }

    /// Store the parsed attributes of a declared entity
    pub(crate) fn finalize_entity(&mut self, id: EntityId, attributes: Vec<Attribute>) {
        if let Some(entity) = self.entity_mut(id) {
            entity.attributes = attributes;
            entity.finalized = true;
        }
    }

    /// Store the parsed body of a declared relationship and mark owned
    /// entities weak
    pub(crate) fn finalize_relationship(
        &mut self,
        id: RelationshipId,
        attributes: Vec<Attribute>,
        endpoints: Vec<Endpoint>,
    ) {
        let owned: Vec<EntityId> = endpoints
            .iter()
            .filter(|e| e.is_owning)
            .map(|e| e.entity)
            .collect();
        if let Some(relationship) = self.relationship_mut(id) {
            relationship.is_owning = !owned.is_empty();
            relationship.attributes = attributes;
            relationship.endpoints = endpoints;
            relationship.finalized = true;
        }
        for entity in owned {
            if let Some(entity) = self.entity_mut(entity) {
                entity.is_weak = true;
            }
        }
    }
}

impl Database for ErDatabase {
    type Node = Entity;
    type Edge = Relationship;

    fn add_node(&mut self, node: Self::Node) -> Result<()> {
        self.add_entity(node).map(|_| ())
    }

    fn add_edge(&mut self, edge: Self::Edge) -> Result<()> {
        self.add_relationship(edge).map(|_| ())
    }

    fn get_node(&self, id: &str) -> Option<&Self::Node> {
        self.get_entity(id)
    }

    fn nodes(&self) -> impl Iterator<Item = &Self::Node> {
        self.entities.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Self::Edge> {
        self.relationships.iter()
    }

    fn clear(&mut self) {
        self.entities.clear();
        self.relationships.clear();
        self.entity_index.clear();
        self.relationship_index.clear();
    }

    fn node_count(&self) -> usize {
        self.entities.len()
    }

    fn edge_count(&self) -> usize {
        self.relationships.len()
    }
}
