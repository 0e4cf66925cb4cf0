//! SQL DDL emission for derived tables.

mod emitter;
mod types;

pub use emitter::{alter_table_statements, create_table, emit_sql, identifier};
pub use types::{COLUMN_TYPE, column_type};
