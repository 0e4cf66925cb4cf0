use crate::validate::Diagnostics;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid diagram, failed checks: {}", .0.failed_names().join(", "))]
    InvalidDiagram(Diagnostics),
    #[error("Relation {relation} references unknown entity {entity:?}")]
    UnknownEntity { relation: String, entity: String },
    #[error("Relation {relation} has invalid cardinality {value:?}")]
    InvalidCardinality { relation: String, value: String },
    #[error("Entity {entity} has no primary key")]
    MissingPrimaryKey { entity: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
