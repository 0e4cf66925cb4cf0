//! Identifier clean-up applied to merged tables before emission.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::ir::Table;

/// Strip diacritics: `Relación` becomes `Relacion`.
pub fn fold_diacritics(name: &str) -> String {
    name.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Fold every identifier of the table and make column names unique by
/// appending `_1`, `_2`, ... to later duplicates.
pub fn sanitize_table(table: &mut Table) {
    table.name = fold_diacritics(&table.name);

    let mut seen: HashSet<String> = HashSet::with_capacity(table.columns.len());
    for column in &mut table.columns {
        let base = fold_diacritics(&column.name);
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        column.name = name;

        if let Some(target) = &column.foreign_key {
            column.foreign_key = Some(fold_diacritics(target));
        }
    }
}

pub fn sanitize_tables(tables: &mut [Table]) {
    for table in tables {
        sanitize_table(table);
    }
}
