//! Rendering of `CREATE TABLE` and foreign-key `ALTER TABLE` statements.

use std::sync::LazyLock;

use regex::Regex;

use super::types::column_type;
use crate::ir::{Column, Table};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Render all tables, then all foreign-key constraints.
pub fn emit_sql(tables: &[Table]) -> String {
    let creates: Vec<String> = tables.iter().map(create_table).collect();
    let alters: Vec<String> = tables.iter().flat_map(alter_table_statements).collect();

    let mut output = creates.join("\n\n");
    if !alters.is_empty() {
        output.push_str("\n\n");
        output.push_str(&alters.join("\n"));
    }
    output
}

/// Identifier as written to SQL: whitespace runs become `_`.
pub fn identifier(name: &str) -> String {
    WHITESPACE.replace_all(name, "_").into_owned()
}

pub fn create_table(table: &Table) -> String {
    let composite = table.has_composite_key();

    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_definition(c, composite))
        .collect();

    if composite {
        let keys: Vec<String> = table.key_columns().map(|c| identifier(&c.name)).collect();
        lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!(
        "CREATE TABLE {} (\n  {}\n);",
        identifier(&table.name),
        lines.join(",\n  ")
    )
}

fn column_definition(column: &Column, composite: bool) -> String {
    let mut def = format!("{} {}", identifier(&column.name), column_type(column));
    // Composite keys are declared once after the columns
    if column.key && !column.is_foreign_key() && !composite {
        def.push_str(" PRIMARY KEY");
    }
    if column.unique {
        def.push_str(" UNIQUE");
    }
    if column.notnull {
        def.push_str(" NOT NULL");
    }
    def
}

pub fn alter_table_statements(table: &Table) -> Vec<String> {
    let table_name = identifier(&table.name);
    table
        .columns
        .iter()
        .filter_map(|c| {
            let target = c.foreign_key.as_deref()?;
            let column = identifier(&c.name);
            Some(format!(
                "ALTER TABLE {} ADD CONSTRAINT FK_{} FOREIGN KEY ({}) REFERENCES {};",
                table_name,
                column,
                column,
                identifier(target)
            ))
        })
        .collect()
}
