pub mod classify;
pub mod diagram;
pub mod error;
pub mod index;
pub mod ir;
pub mod mapper;
pub mod sanitize;
pub mod sql;
pub mod validate;

use wasm_bindgen::prelude::*;

pub use classify::{CardinalityClass, Classified, filter_tables};
pub use diagram::{Attribute, Cardinality, Diagram, Entity, Relation, Side};
pub use error::CompileError;
pub use ir::{Column, Table};
pub use mapper::{process_1n, process_11, process_nm, process_weak_entity};
pub use sql::emit_sql;
pub use validate::{Check, Diagnostics, validate};

use index::DiagramIndex;
use ir::TableMerger;

/// Classify, map, merge and sanitize the diagram's tables.
///
/// No validation is performed; an invalid diagram may fail with a mapper
/// error. Use [`generate_sql`] to gate on [`validate`] first.
pub fn derive_tables(diagram: &Diagram) -> Result<Vec<Table>, CompileError> {
    let index = DiagramIndex::new(diagram);
    let mut merger = TableMerger::new();

    for record in classify::classify(&index)? {
        let tables = mapper::map_classified(&record, &index)?;
        tracing::debug!(
            source = record.name(),
            tables = ?tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "mapped"
        );
        merger.extend(tables);
    }

    let mut tables = merger.finish();
    sanitize::sanitize_tables(&mut tables);
    Ok(tables)
}

/// Validate the diagram and, when valid, compile it to SQL DDL.
pub fn generate_sql(diagram: &Diagram) -> Result<String, CompileError> {
    let diagnostics = validate(diagram);
    if !diagnostics.is_valid {
        tracing::warn!(failed = ?diagnostics.failed_names(), "diagram rejected");
        return Err(CompileError::InvalidDiagram(diagnostics));
    }

    let tables = derive_tables(diagram)?;
    let sql = emit_sql(&tables);
    tracing::info!(
        tables = tables.len(),
        foreign_keys = tables.iter().map(|t| t.foreign_keys().count()).sum::<usize>(),
        "generated schema"
    );
    Ok(sql)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Validate a diagram given as JSON, returning the diagnostics as JSON
#[wasm_bindgen(js_name = "validateDiagram")]
pub fn validate_diagram(source: &str) -> Result<String, String> {
    let diagram = Diagram::from_json(source).map_err(|e| e.to_string())?;
    serde_json::to_string(&validate(&diagram)).map_err(|e| e.to_string())
}

/// Compile a diagram given as JSON to SQL
#[wasm_bindgen(js_name = "diagramToSql")]
pub fn diagram_to_sql(source: &str) -> Result<String, String> {
    let diagram = Diagram::from_json(source).map_err(|e| e.to_string())?;
    generate_sql(&diagram).map_err(|e| e.to_string())
}
