//! Diagram model as maintained by the editor.
//!
//! The compiler only ever reads a [`Diagram`]. The serde shape accepts the
//! editor's persisted JSON: ids may be stored under `idMx`, side references
//! may be a bare id or an `{ "idMx": ... }` object, and layout fields such as
//! positions or cell ids are ignored.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CompileError;

/// Cardinalities a relation side may carry, as written in the editor.
pub const POSSIBLE_CARDINALITIES: [&str; 4] = ["0:1", "0:N", "1:1", "1:N"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Diagram {
    pub fn from_json(source: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub key: bool,
    /// Only meaningful on weak entities.
    #[serde(default)]
    pub discriminant: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: false,
            discriminant: false,
        }
    }

    pub fn key(name: impl Into<String>) -> Self {
        Self {
            key: true,
            ..Self::new(name)
        }
    }

    pub fn discriminant(name: impl Into<String>) -> Self {
        Self {
            discriminant: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(alias = "idMx")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_weak: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    /// Attributes flagged as primary key.
    pub fn primary_keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.key)
    }

    pub fn discriminants(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.discriminant)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    /// Id of the connected entity; empty while the side is unconnected.
    #[serde(default, deserialize_with = "entity_ref")]
    pub entity: String,
    /// Raw `min:max` text, e.g. `1:N`.
    #[serde(default)]
    pub cardinality: String,
}

impl Side {
    pub fn new(entity: impl Into<String>, cardinality: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            cardinality: cardinality.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.entity.trim().is_empty()
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        Cardinality::from_str(&self.cardinality)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(alias = "idMx")]
    pub id: String,
    pub name: String,
    pub side1: Side,
    pub side2: Side,
    #[serde(default)]
    pub is_identifying: bool,
    #[serde(default)]
    pub can_hold_attributes: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Relation {
    pub fn sides(&self) -> [&Side; 2] {
        [&self.side1, &self.side2]
    }

    pub fn touches(&self, entity_id: &str) -> bool {
        self.side1.entity == entity_id || self.side2.entity == entity_id
    }

    pub fn is_reflexive(&self) -> bool {
        self.side1.entity == self.side2.entity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Minimum {
    Zero,
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Maximum {
    One,
    Many,
}

/// A side's participation, split into its minimum and maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub minimum: Minimum,
    pub maximum: Maximum,
}

impl Cardinality {
    pub fn from_str(s: &str) -> Option<Self> {
        let (min, max) = s.split_once(':')?;
        let minimum = match min {
            "0" => Minimum::Zero,
            "1" => Minimum::One,
            _ => return None,
        };
        let maximum = match max {
            "1" => Maximum::One,
            "N" => Maximum::Many,
            _ => return None,
        };
        Some(Self { minimum, maximum })
    }

    pub fn is_mandatory(&self) -> bool {
        self.minimum == Minimum::One
    }

    pub fn is_many(&self) -> bool {
        self.maximum == Maximum::Many
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = match self.minimum {
            Minimum::Zero => "0",
            Minimum::One => "1",
        };
        let max = match self.maximum {
            Maximum::One => "1",
            Maximum::Many => "N",
        };
        write!(f, "{}:{}", min, max)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityRef {
    Id(String),
    Object {
        #[serde(default, alias = "idMx")]
        id: String,
    },
}

fn entity_ref<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match EntityRef::deserialize(deserializer)? {
        EntityRef::Id(id) => id,
        EntityRef::Object { id } => id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_enumeration() {
        for raw in POSSIBLE_CARDINALITIES {
            let card = Cardinality::from_str(raw).unwrap();
            assert_eq!(card.to_string(), raw);
        }
        assert!(Cardinality::from_str("N:1").is_none());
        assert!(Cardinality::from_str("1:n").is_none());
        assert!(Cardinality::from_str("").is_none());
        assert!(Cardinality::from_str("2:N").is_none());
    }

    #[test]
    fn test_cardinality_split() {
        let card = Cardinality::from_str("0:N").unwrap();
        assert_eq!(card.minimum, Minimum::Zero);
        assert_eq!(card.maximum, Maximum::Many);
        assert!(!card.is_mandatory());
        assert!(card.is_many());
    }

    #[test]
    fn test_from_editor_json() {
        let source = r#"{
            "entities": [
                {
                    "idMx": "2",
                    "name": "Entidad",
                    "position": { "x": 10, "y": 20 },
                    "attributes": [
                        { "idMx": "4", "name": "Atributo", "key": true, "cell": ["4", "5"] }
                    ]
                }
            ],
            "relations": [
                {
                    "idMx": "7",
                    "name": "Relacion",
                    "side1": { "idMx": "8", "cardinality": "1:1", "entity": { "idMx": "2" } },
                    "side2": { "idMx": "9", "cardinality": "0:N", "entity": { "idMx": "2" } },
                    "canHoldAttributes": false,
                    "attributes": []
                }
            ]
        }"#;
        let diagram = Diagram::from_json(source).unwrap();

        assert_eq!(diagram.entities[0].id, "2");
        assert!(diagram.entities[0].attributes[0].key);
        assert!(!diagram.entities[0].is_weak);
        assert_eq!(diagram.relations[0].side1.entity, "2");
        assert!(diagram.relations[0].is_reflexive());
        assert!(!diagram.relations[0].is_identifying);
    }

    #[test]
    fn test_side_entity_as_plain_id() {
        let source = r#"{
            "entities": [],
            "relations": [
                {
                    "id": "r",
                    "name": "R",
                    "side1": { "entity": "a", "cardinality": "1:N" },
                    "side2": { "entity": { "idMx": "" }, "cardinality": "" }
                }
            ]
        }"#;
        let diagram = Diagram::from_json(source).unwrap();

        assert_eq!(diagram.relations[0].side1.entity, "a");
        assert!(!diagram.relations[0].side2.is_connected());
        assert!(diagram.relations[0].side2.cardinality().is_none());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Diagram::from_json("{ not json"),
            Err(CompileError::Json(_))
        ));
    }
}
