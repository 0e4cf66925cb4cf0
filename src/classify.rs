//! Relation classification by the maxima of both sides.

use std::collections::HashSet;
use std::fmt;

use crate::diagram::{Attribute, Cardinality, Diagram, Entity, Relation, Side};
use crate::error::CompileError;
use crate::index::DiagramIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalityClass {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl CardinalityClass {
    pub fn from_sides(side1: Cardinality, side2: Cardinality) -> Self {
        match (side1.is_many(), side2.is_many()) {
            (false, false) => Self::OneToOne,
            (true, true) => Self::ManyToMany,
            _ => Self::OneToMany,
        }
    }
}

impl fmt::Display for CardinalityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:M",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSide<'a> {
    pub entity: &'a Entity,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedRelation<'a> {
    pub name: &'a str,
    pub class: CardinalityClass,
    pub side1: ClassifiedSide<'a>,
    pub side2: ClassifiedSide<'a>,
    pub is_identifying: bool,
    pub attributes: &'a [Attribute],
}

impl ClassifiedRelation<'_> {
    pub fn is_reflexive(&self) -> bool {
        self.side1.entity.id == self.side2.entity.id
    }
}

/// One record per relation, then one per entity left for standalone or
/// weak-entity mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    Relation(ClassifiedRelation<'a>),
    Entity(&'a Entity),
}

impl Classified<'_> {
    pub fn class(&self) -> Option<CardinalityClass> {
        match self {
            Classified::Relation(r) => Some(r.class),
            Classified::Entity(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Classified::Relation(r) => r.name,
            Classified::Entity(e) => &e.name,
        }
    }
}

/// Classify every relation and append the entities no relation consumed.
///
/// Weak entities are always appended, even though their identifying
/// relation touches them; their table comes from the weak-entity mapper.
pub fn filter_tables(diagram: &Diagram) -> Result<Vec<Classified<'_>>, CompileError> {
    classify(&DiagramIndex::new(diagram))
}

pub(crate) fn classify<'a>(index: &DiagramIndex<'a>) -> Result<Vec<Classified<'a>>, CompileError> {
    let diagram = index.diagram();
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut classified = Vec::with_capacity(diagram.relations.len());

    for relation in &diagram.relations {
        let side1 = classify_side(relation, &relation.side1, index)?;
        let side2 = classify_side(relation, &relation.side2, index)?;
        let class = CardinalityClass::from_sides(side1.cardinality, side2.cardinality);
        tracing::debug!(relation = %relation.name, class = %class, "classified relation");

        consumed.insert(side1.entity.id.as_str());
        consumed.insert(side2.entity.id.as_str());
        classified.push(Classified::Relation(ClassifiedRelation {
            name: &relation.name,
            class,
            side1,
            side2,
            is_identifying: relation.is_identifying,
            attributes: &relation.attributes,
        }));
    }

    classified.extend(
        diagram
            .entities
            .iter()
            .filter(|e| e.is_weak || !consumed.contains(e.id.as_str()))
            .map(Classified::Entity),
    );

    Ok(classified)
}

fn classify_side<'a>(
    relation: &Relation,
    side: &Side,
    index: &DiagramIndex<'a>,
) -> Result<ClassifiedSide<'a>, CompileError> {
    let entity = index
        .entity(&side.entity)
        .ok_or_else(|| CompileError::UnknownEntity {
            relation: relation.name.clone(),
            entity: side.entity.clone(),
        })?;
    let cardinality = side
        .cardinality()
        .ok_or_else(|| CompileError::InvalidCardinality {
            relation: relation.name.clone(),
            value: side.cardinality.clone(),
        })?;
    Ok(ClassifiedSide {
        entity,
        cardinality,
    })
}
