//! Structural and semantic checks run before compilation.
//!
//! Every check runs independently; [`Diagnostics`] records each outcome so
//! the editor can report all of them at once.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagram::{Attribute, Cardinality, Diagram, Entity, Relation};
use crate::index::DiagramIndex;

static RELATION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 _]+$").expect("relation name pattern is valid")
});

/// Outcome of every check. `true` means the check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub not_empty: bool,
    pub no_repeated_names: bool,
    pub no_repeated_attr_names: bool,
    pub no_entities_without_attributes: bool,
    #[serde(rename = "noEntitiesWithoutPK")]
    pub no_entities_without_pk: bool,
    #[serde(rename = "noEntitiesWithMoreThanOnePK")]
    pub no_entities_with_more_than_one_pk: bool,
    #[serde(rename = "noNMRelationsWithPK")]
    pub no_nm_relations_with_pk: bool,
    #[serde(rename = "noNotNMRelationsWithAttributes")]
    pub no_not_nm_relations_with_attributes: bool,
    pub no_unconnected_relations: bool,
    pub no_not_valid_cardinalities: bool,
    pub no_invalid_relation_names: bool,
    pub no_weak_entity_with_primary_key: bool,
    pub no_weak_entity_invalid_relation_count: bool,
    pub no_weak_entity_wrong_cardinality: bool,
    pub no_weak_entity_no_discriminant: bool,
    pub no_weak_entity_connected_to_non_identifying_relation: bool,
    pub no_weak_entity_owned_by_weak_entity: bool,
    pub is_valid: bool,
}

/// One named check of [`Diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    NotEmpty,
    NoRepeatedNames,
    NoRepeatedAttrNames,
    NoEntitiesWithoutAttributes,
    NoEntitiesWithoutPk,
    NoEntitiesWithMoreThanOnePk,
    NoNmRelationsWithPk,
    NoNotNmRelationsWithAttributes,
    NoUnconnectedRelations,
    NoNotValidCardinalities,
    NoInvalidRelationNames,
    NoWeakEntityWithPrimaryKey,
    NoWeakEntityInvalidRelationCount,
    NoWeakEntityWrongCardinality,
    NoWeakEntityNoDiscriminant,
    NoWeakEntityConnectedToNonIdentifyingRelation,
    NoWeakEntityOwnedByWeakEntity,
}

impl Check {
    pub const ALL: [Check; 17] = [
        Check::NotEmpty,
        Check::NoRepeatedNames,
        Check::NoRepeatedAttrNames,
        Check::NoEntitiesWithoutAttributes,
        Check::NoEntitiesWithoutPk,
        Check::NoEntitiesWithMoreThanOnePk,
        Check::NoNmRelationsWithPk,
        Check::NoNotNmRelationsWithAttributes,
        Check::NoUnconnectedRelations,
        Check::NoNotValidCardinalities,
        Check::NoInvalidRelationNames,
        Check::NoWeakEntityWithPrimaryKey,
        Check::NoWeakEntityInvalidRelationCount,
        Check::NoWeakEntityWrongCardinality,
        Check::NoWeakEntityNoDiscriminant,
        Check::NoWeakEntityConnectedToNonIdentifyingRelation,
        Check::NoWeakEntityOwnedByWeakEntity,
    ];

    /// Field name used in the serialized diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Check::NotEmpty => "notEmpty",
            Check::NoRepeatedNames => "noRepeatedNames",
            Check::NoRepeatedAttrNames => "noRepeatedAttrNames",
            Check::NoEntitiesWithoutAttributes => "noEntitiesWithoutAttributes",
            Check::NoEntitiesWithoutPk => "noEntitiesWithoutPK",
            Check::NoEntitiesWithMoreThanOnePk => "noEntitiesWithMoreThanOnePK",
            Check::NoNmRelationsWithPk => "noNMRelationsWithPK",
            Check::NoNotNmRelationsWithAttributes => "noNotNMRelationsWithAttributes",
            Check::NoUnconnectedRelations => "noUnconnectedRelations",
            Check::NoNotValidCardinalities => "noNotValidCardinalities",
            Check::NoInvalidRelationNames => "noInvalidRelationNames",
            Check::NoWeakEntityWithPrimaryKey => "noWeakEntityWithPrimaryKey",
            Check::NoWeakEntityInvalidRelationCount => "noWeakEntityInvalidRelationCount",
            Check::NoWeakEntityWrongCardinality => "noWeakEntityWrongCardinality",
            Check::NoWeakEntityNoDiscriminant => "noWeakEntityNoDiscriminant",
            Check::NoWeakEntityConnectedToNonIdentifyingRelation => {
                "noWeakEntityConnectedToNonIdentifyingRelation"
            }
            Check::NoWeakEntityOwnedByWeakEntity => "noWeakEntityOwnedByWeakEntity",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Check::NotEmpty => "The diagram is empty",
            Check::NoRepeatedNames => "Two entities or relations share a name",
            Check::NoRepeatedAttrNames => {
                "An entity or N:M relation has two attributes with the same name"
            }
            Check::NoEntitiesWithoutAttributes => "An entity has no attributes",
            Check::NoEntitiesWithoutPk => "An entity has no primary key",
            Check::NoEntitiesWithMoreThanOnePk => "An entity has more than one primary key",
            Check::NoNmRelationsWithPk => "An N:M relation attribute is marked as key",
            Check::NoNotNmRelationsWithAttributes => {
                "A relation that is not N:M carries attributes"
            }
            Check::NoUnconnectedRelations => "A relation is not connected to two entities",
            Check::NoNotValidCardinalities => "A relation has an invalid cardinality",
            Check::NoInvalidRelationNames => {
                "A relation name is empty or contains special characters"
            }
            Check::NoWeakEntityWithPrimaryKey => "A weak entity has a primary key",
            Check::NoWeakEntityInvalidRelationCount => {
                "A weak entity is not connected to exactly one relation"
            }
            Check::NoWeakEntityWrongCardinality => {
                "A weak entity relation must be 0:N or 1:N on the weak side and 1:1 on the owner side"
            }
            Check::NoWeakEntityNoDiscriminant => "A weak entity has no discriminant attribute",
            Check::NoWeakEntityConnectedToNonIdentifyingRelation => {
                "A weak entity must be connected through exactly one identifying relation"
            }
            Check::NoWeakEntityOwnedByWeakEntity => "A weak entity is owned by another weak entity",
        }
    }
}

impl Diagnostics {
    pub fn passed(&self, check: Check) -> bool {
        match check {
            Check::NotEmpty => self.not_empty,
            Check::NoRepeatedNames => self.no_repeated_names,
            Check::NoRepeatedAttrNames => self.no_repeated_attr_names,
            Check::NoEntitiesWithoutAttributes => self.no_entities_without_attributes,
            Check::NoEntitiesWithoutPk => self.no_entities_without_pk,
            Check::NoEntitiesWithMoreThanOnePk => self.no_entities_with_more_than_one_pk,
            Check::NoNmRelationsWithPk => self.no_nm_relations_with_pk,
            Check::NoNotNmRelationsWithAttributes => self.no_not_nm_relations_with_attributes,
            Check::NoUnconnectedRelations => self.no_unconnected_relations,
            Check::NoNotValidCardinalities => self.no_not_valid_cardinalities,
            Check::NoInvalidRelationNames => self.no_invalid_relation_names,
            Check::NoWeakEntityWithPrimaryKey => self.no_weak_entity_with_primary_key,
            Check::NoWeakEntityInvalidRelationCount => self.no_weak_entity_invalid_relation_count,
            Check::NoWeakEntityWrongCardinality => self.no_weak_entity_wrong_cardinality,
            Check::NoWeakEntityNoDiscriminant => self.no_weak_entity_no_discriminant,
            Check::NoWeakEntityConnectedToNonIdentifyingRelation => {
                self.no_weak_entity_connected_to_non_identifying_relation
            }
            Check::NoWeakEntityOwnedByWeakEntity => self.no_weak_entity_owned_by_weak_entity,
        }
    }

    /// Every failed check, in declaration order.
    pub fn failed_checks(&self) -> Vec<Check> {
        Check::ALL
            .into_iter()
            .filter(|check| !self.passed(*check))
            .collect()
    }

    pub fn failed_names(&self) -> Vec<&'static str> {
        self.failed_checks().into_iter().map(Check::name).collect()
    }
}

/// Run every check against the diagram. Never mutates its input.
pub fn validate(diagram: &Diagram) -> Diagnostics {
    let index = DiagramIndex::new(diagram);
    let weak: Vec<&Entity> = diagram.entities.iter().filter(|e| e.is_weak).collect();
    let strong: Vec<&Entity> = diagram.entities.iter().filter(|e| !e.is_weak).collect();

    let mut diagnostics = Diagnostics {
        not_empty: !diagram.is_empty(),
        no_repeated_names: !repeated_names(diagram),
        no_repeated_attr_names: !repeated_attribute_names(diagram),
        no_entities_without_attributes: strong.iter().all(|e| !e.attributes.is_empty()),
        no_entities_without_pk: strong.iter().all(|e| e.primary_keys().count() > 0),
        no_entities_with_more_than_one_pk: strong.iter().all(|e| e.primary_keys().count() <= 1),
        no_nm_relations_with_pk: !diagram
            .relations
            .iter()
            .filter(|r| is_nm(r))
            .any(|r| r.attributes.iter().any(|a| a.key)),
        no_not_nm_relations_with_attributes: diagram
            .relations
            .iter()
            .all(|r| r.can_hold_attributes || r.attributes.is_empty()),
        no_unconnected_relations: diagram.relations.iter().all(|r| {
            r.sides()
                .iter()
                .all(|s| s.is_connected() && index.entity(&s.entity).is_some())
        }),
        no_not_valid_cardinalities: diagram.relations.iter().all(valid_cardinalities),
        no_invalid_relation_names: diagram
            .relations
            .iter()
            .all(|r| RELATION_NAME.is_match(r.name.trim())),
        no_weak_entity_with_primary_key: weak.iter().all(|e| e.primary_keys().count() == 0),
        no_weak_entity_invalid_relation_count: weak
            .iter()
            .all(|e| index.relations_of(&e.id).len() == 1),
        no_weak_entity_wrong_cardinality: diagram
            .relations
            .iter()
            .all(|r| valid_weak_cardinalities(r, &index)),
        no_weak_entity_no_discriminant: weak.iter().all(|e| e.discriminants().count() > 0),
        no_weak_entity_connected_to_non_identifying_relation: weak
            .iter()
            .all(|e| index.identifying_relations_of(&e.id).count() == 1),
        no_weak_entity_owned_by_weak_entity: weak.iter().all(|e| {
            index.identifying_relations_of(&e.id).all(|r| {
                let owner = if r.side1.entity == e.id { &r.side2 } else { &r.side1 };
                index.entity(&owner.entity).is_none_or(|o| !o.is_weak)
            })
        }),
        is_valid: true,
    };
    diagnostics.is_valid = diagnostics.failed_checks().is_empty();

    if !diagnostics.is_valid {
        tracing::debug!(failed = ?diagnostics.failed_names(), "diagram failed validation");
    }

    diagnostics
}

fn repeated_names(diagram: &Diagram) -> bool {
    let mut seen = HashSet::new();
    let names = diagram
        .entities
        .iter()
        .map(|e| e.name.as_str())
        .chain(diagram.relations.iter().map(|r| r.name.as_str()));
    for name in names {
        if !seen.insert(name) {
            return true;
        }
    }
    false
}

fn repeated_attribute_names(diagram: &Diagram) -> bool {
    let has_repeated = |attributes: &[Attribute]| {
        let mut seen = HashSet::new();
        attributes.iter().any(|a| !seen.insert(a.name.as_str()))
    };

    diagram.entities.iter().any(|e| has_repeated(&e.attributes))
        || diagram
            .relations
            .iter()
            .filter(|r| r.can_hold_attributes)
            .any(|r| has_repeated(&r.attributes))
}

fn is_nm(relation: &Relation) -> bool {
    relation.can_hold_attributes
        || relation
            .sides()
            .iter()
            .all(|s| s.cardinality().is_some_and(|c| c.is_many()))
}

fn valid_cardinalities(relation: &Relation) -> bool {
    let parsed: Option<Vec<Cardinality>> = relation.sides().iter().map(|s| s.cardinality()).collect();
    match parsed {
        Some(cards) => !cards.iter().all(|c| c.is_mandatory() && !c.is_many()),
        None => false,
    }
}

fn valid_weak_cardinalities(relation: &Relation, index: &DiagramIndex) -> bool {
    let is_weak = |id: &str| index.entity(id).is_some_and(|e| e.is_weak);
    let (weak_side, strong_side) = if is_weak(&relation.side1.entity) {
        (&relation.side1, &relation.side2)
    } else if is_weak(&relation.side2.entity) {
        (&relation.side2, &relation.side1)
    } else {
        return true;
    };

    matches!(weak_side.cardinality.as_str(), "0:N" | "1:N") && strong_side.cardinality == "1:1"
}
