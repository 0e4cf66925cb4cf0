//! Id lookup tables built once per validation or compilation.

use std::collections::HashMap;

use crate::diagram::{Diagram, Entity, Relation};

pub struct DiagramIndex<'a> {
    diagram: &'a Diagram,
    entities: HashMap<&'a str, &'a Entity>,
    relations_by_entity: HashMap<&'a str, Vec<&'a Relation>>,
}

impl<'a> DiagramIndex<'a> {
    pub fn new(diagram: &'a Diagram) -> Self {
        let entities = diagram
            .entities
            .iter()
            .map(|e| (e.id.as_str(), e))
            .collect();

        let mut relations_by_entity: HashMap<&str, Vec<&Relation>> = HashMap::new();
        for relation in &diagram.relations {
            relations_by_entity
                .entry(relation.side1.entity.as_str())
                .or_default()
                .push(relation);
            // A reflexive relation is listed once
            if !relation.is_reflexive() {
                relations_by_entity
                    .entry(relation.side2.entity.as_str())
                    .or_default()
                    .push(relation);
            }
        }

        Self {
            diagram,
            entities,
            relations_by_entity,
        }
    }

    pub fn diagram(&self) -> &'a Diagram {
        self.diagram
    }

    pub fn entity(&self, id: &str) -> Option<&'a Entity> {
        self.entities.get(id).copied()
    }

    /// Relations with at least one side on the given entity, in diagram order.
    pub fn relations_of(&self, entity_id: &str) -> &[&'a Relation] {
        self.relations_by_entity
            .get(entity_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn identifying_relations_of(
        &self,
        entity_id: &str,
    ) -> impl Iterator<Item = &'a Relation> + '_ {
        self.relations_of(entity_id)
            .iter()
            .copied()
            .filter(|r| r.is_identifying)
    }
}
