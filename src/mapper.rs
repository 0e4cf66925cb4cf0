//! Cardinality-specific mapping of classified relations to draft tables.
//!
//! The mappers assume a diagram that passed validation. A missing primary
//! key on a side that needs one is reported as an error instead of being
//! papered over.

use crate::classify::{CardinalityClass, Classified, ClassifiedRelation, ClassifiedSide};
use crate::diagram::{Attribute, Entity};
use crate::error::CompileError;
use crate::index::DiagramIndex;
use crate::ir::{Column, Table};

/// Map one classification record to its draft tables.
pub fn map_classified(
    record: &Classified<'_>,
    index: &DiagramIndex<'_>,
) -> Result<Vec<Table>, CompileError> {
    match record {
        Classified::Relation(relation) => match relation.class {
            CardinalityClass::OneToOne => process_11(relation),
            CardinalityClass::OneToMany => process_1n(relation),
            CardinalityClass::ManyToMany => process_nm(relation),
        },
        Classified::Entity(entity) if entity.is_weak => process_weak_entity(entity, index),
        Classified::Entity(entity) => Ok(vec![entity_table(entity)]),
    }
}

pub fn process_1n(relation: &ClassifiedRelation<'_>) -> Result<Vec<Table>, CompileError> {
    let (one, many) = if relation.side1.cardinality.is_many() {
        (relation.side2, relation.side1)
    } else {
        (relation.side1, relation.side2)
    };
    let notnull = one.cardinality.is_mandatory();

    let one_table = entity_table(one.entity);

    let mut columns: Vec<Column> = many
        .entity
        .attributes
        .iter()
        .map(Column::from_attribute)
        .collect();
    for pk in primary_keys(one.entity)? {
        columns.push(Column {
            notnull,
            foreign_key: Some(one.entity.name.clone()),
            ..Column::new(relation_column(pk, relation.name))
        });
    }
    let many_table = Table::new(many.entity.name.clone(), columns);

    if relation.is_reflexive() {
        return Ok(vec![many_table]);
    }
    // The weak side's table is built from its identifying relation instead
    if relation.is_identifying && many.entity.is_weak {
        return Ok(vec![one_table]);
    }
    Ok(vec![one_table, many_table])
}

pub fn process_11(relation: &ClassifiedRelation<'_>) -> Result<Vec<Table>, CompileError> {
    let (side1, side2) = (relation.side1, relation.side2);

    if side1.cardinality.is_mandatory() && side2.cardinality.is_mandatory() {
        let first = side1.entity.attributes.iter().map(|a| Column {
            key: a.key,
            ..Column::new(relation_column(a, relation.name))
        });
        let second = side2.entity.attributes.iter().map(|a| Column {
            notnull: a.key,
            unique: a.key,
            ..Column::new(relation_column(a, relation.name))
        });
        let merged = Table::new(relation.name, first.chain(second).collect());
        return Ok(vec![merged]);
    }

    let (fk_side, pk_side, notnull) = match (
        side1.cardinality.is_mandatory(),
        side2.cardinality.is_mandatory(),
    ) {
        (false, false) => (side1, side2, false),
        (false, true) => (side1, side2, true),
        _ => (side2, side1, true),
    };

    let without_fk = entity_table(pk_side.entity);

    let mut columns: Vec<Column> = fk_side
        .entity
        .attributes
        .iter()
        .map(Column::from_attribute)
        .collect();
    for pk in primary_keys(pk_side.entity)? {
        columns.push(Column {
            notnull,
            unique: true,
            foreign_key: Some(pk_side.entity.name.clone()),
            ..Column::new(relation_column(pk, relation.name))
        });
    }
    let with_fk = Table::new(fk_side.entity.name.clone(), columns);

    if relation.is_reflexive() {
        return Ok(vec![with_fk]);
    }
    Ok(vec![without_fk, with_fk])
}

pub fn process_nm(relation: &ClassifiedRelation<'_>) -> Result<Vec<Table>, CompileError> {
    let first = entity_table(relation.side1.entity);
    let second = entity_table(relation.side2.entity);

    let mut columns = junction_keys(relation, relation.side1, 1)?;
    columns.extend(junction_keys(relation, relation.side2, 2)?);
    columns.extend(relation.attributes.iter().map(|a| Column::new(a.name.clone())));
    let junction = Table::new(relation.name, columns);

    if relation.is_reflexive() {
        return Ok(vec![first, junction]);
    }
    Ok(vec![first, second, junction])
}

/// Build the table of a weak entity from its identifying relation.
///
/// The owner's primary key columns come first, then the discriminants; all
/// of them together form the composite key. Other attributes follow as
/// plain columns. Returns no table when no identifying relation exists.
pub fn process_weak_entity(
    entity: &Entity,
    index: &DiagramIndex<'_>,
) -> Result<Vec<Table>, CompileError> {
    let Some(relation) = index.identifying_relations_of(&entity.id).next() else {
        tracing::warn!(entity = %entity.name, "weak entity has no identifying relation");
        return Ok(vec![]);
    };

    let owner_side = if relation.side1.entity == entity.id {
        &relation.side2
    } else {
        &relation.side1
    };
    let owner = index
        .entity(&owner_side.entity)
        .ok_or_else(|| CompileError::UnknownEntity {
            relation: relation.name.clone(),
            entity: owner_side.entity.clone(),
        })?;

    let mut columns = Vec::with_capacity(entity.attributes.len() + 1);
    for pk in primary_keys(owner)? {
        columns.push(Column {
            key: true,
            notnull: true,
            foreign_key: Some(owner.name.clone()),
            ..Column::new(relation_column(pk, &relation.name))
        });
    }
    columns.extend(entity.discriminants().map(|a| Column {
        key: true,
        notnull: true,
        ..Column::new(a.name.clone())
    }));
    columns.extend(
        entity
            .attributes
            .iter()
            .filter(|a| !a.discriminant)
            .map(|a| Column::new(a.name.clone())),
    );

    Ok(vec![Table::new(entity.name.clone(), columns)])
}

fn entity_table(entity: &Entity) -> Table {
    Table::new(
        entity.name.clone(),
        entity.attributes.iter().map(Column::from_attribute).collect(),
    )
}

fn junction_keys(
    relation: &ClassifiedRelation<'_>,
    side: ClassifiedSide<'_>,
    position: usize,
) -> Result<Vec<Column>, CompileError> {
    Ok(primary_keys(side.entity)?
        .into_iter()
        .map(|pk| Column {
            key: true,
            foreign_key: Some(side.entity.name.clone()),
            ..Column::new(format!("{}_{}", relation_column(pk, relation.name), position))
        })
        .collect())
}

fn primary_keys(entity: &Entity) -> Result<Vec<&Attribute>, CompileError> {
    let keys: Vec<&Attribute> = entity.primary_keys().collect();
    if keys.is_empty() {
        return Err(CompileError::MissingPrimaryKey {
            entity: entity.name.clone(),
        });
    }
    Ok(keys)
}

fn relation_column(attribute: &Attribute, relation: &str) -> String {
    format!("{}_{}", attribute.name, relation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::filter_tables;
    use crate::diagram::{Diagram, Relation, Side};

    fn entity(id: &str, name: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            is_weak: false,
            attributes: vec![Attribute::key("Atributo")],
        }
    }

    fn diagram(card1: &str, card2: &str) -> Diagram {
        Diagram {
            entities: vec![entity("1", "Entidad"), entity("2", "Entidad_1")],
            relations: vec![Relation {
                id: "3".to_string(),
                name: "Relacion".to_string(),
                side1: Side::new("1", card1),
                side2: Side::new("2", card2),
                ..Relation::default()
            }],
        }
    }

    fn reflexive(card1: &str, card2: &str) -> Diagram {
        let mut diagram = diagram(card1, card2);
        diagram.entities.truncate(1);
        diagram.relations[0].side2.entity = "1".to_string();
        diagram
    }

    fn map_first(diagram: &Diagram) -> Vec<Table> {
        let index = DiagramIndex::new(diagram);
        let records = filter_tables(diagram).unwrap();
        map_classified(&records[0], &index).unwrap()
    }

    fn names(table: &Table) -> Vec<&str> {
        table.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_1n_optional() {
        let tables = map_first(&diagram("0:1", "0:N"));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "Entidad");
        assert_eq!(names(&tables[0]), vec!["Atributo"]);
        assert_eq!(tables[1].name, "Entidad_1");
        assert_eq!(names(&tables[1]), vec!["Atributo", "Atributo_Relacion"]);

        let fk = &tables[1].columns[1];
        assert!(!fk.key && !fk.notnull);
        assert_eq!(fk.foreign_key.as_deref(), Some("Entidad"));
    }

    #[test]
    fn test_1n_mandatory_one_side() {
        let tables = map_first(&diagram("1:1", "0:N"));
        assert!(tables[1].columns[1].notnull);

        // The one side may also be side 2
        let tables = map_first(&diagram("1:N", "1:1"));
        assert_eq!(tables[0].name, "Entidad_1");
        assert_eq!(tables[1].name, "Entidad");
        assert!(tables[1].columns[1].notnull);
        assert_eq!(tables[1].columns[1].foreign_key.as_deref(), Some("Entidad_1"));
    }

    #[test]
    fn test_1n_reflexive() {
        let tables = map_first(&reflexive("0:1", "0:N"));
        assert_eq!(tables.len(), 1);
        assert_eq!(names(&tables[0]), vec!["Atributo", "Atributo_Relacion"]);
        assert_eq!(tables[0].columns[1].foreign_key.as_deref(), Some("Entidad"));
    }

    #[test]
    fn test_11_mandatory_collapses() {
        let tables = map_first(&diagram("1:1", "1:1"));
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Relacion");
        assert_eq!(names(&tables[0]), vec!["Atributo_Relacion", "Atributo_Relacion"]);

        let (first, second) = (&tables[0].columns[0], &tables[0].columns[1]);
        assert!(first.key && !first.notnull && !first.unique);
        assert!(!second.key && second.notnull && second.unique);
    }

    #[test]
    fn test_11_one_optional_side() {
        let tables = map_first(&diagram("0:1", "1:1"));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "Entidad_1");
        assert_eq!(tables[1].name, "Entidad");

        let fk = &tables[1].columns[1];
        assert_eq!(fk.name, "Atributo_Relacion");
        assert!(fk.unique && fk.notnull && !fk.key);
        assert_eq!(fk.foreign_key.as_deref(), Some("Entidad_1"));

        let tables = map_first(&diagram("1:1", "0:1"));
        assert_eq!(tables[0].name, "Entidad");
        assert_eq!(tables[1].name, "Entidad_1");
    }

    #[test]
    fn test_11_both_optional() {
        let tables = map_first(&diagram("0:1", "0:1"));
        assert_eq!(tables[0].name, "Entidad_1");
        assert_eq!(tables[1].name, "Entidad");

        let fk = &tables[1].columns[1];
        assert!(fk.unique && !fk.notnull);
    }

    #[test]
    fn test_11_reflexive() {
        let tables = map_first(&reflexive("0:1", "0:1"));
        assert_eq!(tables.len(), 1);
        assert_eq!(names(&tables[0]), vec!["Atributo", "Atributo_Relacion"]);
    }

    #[test]
    fn test_nm_junction() {
        let mut diagram = diagram("0:N", "1:N");
        diagram.relations[0].attributes = vec![Attribute::new("nota")];
        let tables = map_first(&diagram);

        assert_eq!(tables.len(), 3);
        assert_eq!(tables[2].name, "Relacion");
        assert_eq!(
            names(&tables[2]),
            vec!["Atributo_Relacion_1", "Atributo_Relacion_2", "nota"]
        );
        assert_eq!(tables[2].columns[0].foreign_key.as_deref(), Some("Entidad"));
        assert_eq!(tables[2].columns[1].foreign_key.as_deref(), Some("Entidad_1"));
        assert_eq!(
            tables[2].columns.iter().filter(|c| c.key && c.is_foreign_key()).count(),
            2
        );
        assert!(!tables[2].columns[2].key);
        assert!(tables[0].columns[0].key);
    }

    #[test]
    fn test_nm_reflexive() {
        let tables = map_first(&reflexive("0:N", "0:N"));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "Entidad");
        assert_eq!(tables[1].name, "Relacion");
        assert!(tables[1]
            .columns
            .iter()
            .all(|c| c.foreign_key.as_deref() == Some("Entidad")));
    }

    #[test]
    fn test_missing_primary_key_fails_fast() {
        let mut diagram = diagram("0:N", "1:N");
        diagram.entities[1].attributes[0].key = false;
        let index = DiagramIndex::new(&diagram);
        let records = filter_tables(&diagram).unwrap();

        let err = map_classified(&records[0], &index).unwrap_err();
        assert!(matches!(err, CompileError::MissingPrimaryKey { entity } if entity == "Entidad_1"));
    }

    fn weak_diagram() -> Diagram {
        let mut diagram = diagram("1:1", "0:N");
        diagram.relations[0].is_identifying = true;
        diagram.entities[1].is_weak = true;
        diagram.entities[1].attributes = vec![
            Attribute::discriminant("numero"),
            Attribute::new("capacidad"),
        ];
        diagram
    }

    #[test]
    fn test_identifying_relation_keeps_owner_only() {
        let tables = map_first(&weak_diagram());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Entidad");
    }

    #[test]
    fn test_weak_entity_table() {
        let diagram = weak_diagram();
        let index = DiagramIndex::new(&diagram);
        let tables = process_weak_entity(&diagram.entities[1], &index).unwrap();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.name, "Entidad_1");
        assert_eq!(names(table), vec!["Atributo_Relacion", "numero", "capacidad"]);

        let inherited = &table.columns[0];
        assert!(inherited.key && inherited.notnull);
        assert_eq!(inherited.foreign_key.as_deref(), Some("Entidad"));
        let discriminant = &table.columns[1];
        assert!(discriminant.key && discriminant.notnull && !discriminant.is_foreign_key());
        assert!(!table.columns[2].key);
        assert!(table.has_composite_key());
    }

    #[test]
    fn test_weak_entity_without_identifying_relation() {
        let mut diagram = weak_diagram();
        diagram.relations[0].is_identifying = false;
        let index = DiagramIndex::new(&diagram);
        let tables = process_weak_entity(&diagram.entities[1], &index).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_standalone_entity() {
        let mut diagram = diagram("1:1", "0:N");
        diagram.entities.push(Entity {
            attributes: vec![Attribute::key("id"), Attribute::new("x")],
            ..entity("9", "Suelta")
        });
        let index = DiagramIndex::new(&diagram);
        let records = filter_tables(&diagram).unwrap();
        let tables = map_classified(&records[1], &index).unwrap();

        assert_eq!(tables, vec![Table::new(
            "Suelta",
            vec![
                Column {
                    key: true,
                    ..Column::new("id")
                },
                Column::new("x"),
            ],
        )]);
    }
}
