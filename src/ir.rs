//! Derived tables produced by the mappers, and the merger that folds
//! contributions from several relations into one table per name.

use std::collections::{HashMap, HashSet};

use crate::diagram::Attribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub key: bool,
    pub notnull: bool,
    pub unique: bool,
    /// Name of the referenced table.
    pub foreign_key: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: false,
            notnull: false,
            unique: false,
            foreign_key: None,
        }
    }

    /// Copy of an attribute, keeping only its key flag.
    pub fn from_attribute(attribute: &Attribute) -> Self {
        Self {
            key: attribute.key,
            ..Self::new(attribute.name.clone())
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True when a key column is also a foreign key; all key columns then
    /// form one composite primary key.
    pub fn has_composite_key(&self) -> bool {
        self.columns.iter().any(|c| c.key && c.is_foreign_key())
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_foreign_key())
    }
}

/// Name-keyed accumulator preserving first-insertion order.
#[derive(Debug, Default)]
pub struct TableMerger {
    tables: Vec<Table>,
    positions: HashMap<String, usize>,
}

impl TableMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a draft table. When the name already exists its columns are
    /// unioned by name, keeping the first occurrence.
    pub fn add(&mut self, table: Table) {
        match self.positions.get(&table.name) {
            Some(&pos) => {
                let existing = &mut self.tables[pos];
                let known: HashSet<String> =
                    existing.columns.iter().map(|c| c.name.clone()).collect();
                let added = table
                    .columns
                    .into_iter()
                    .filter(|c| !known.contains(&c.name));
                existing.columns.extend(added);
            }
            None => {
                self.positions.insert(table.name.clone(), self.tables.len());
                self.tables.push(table);
            }
        }
    }

    pub fn extend(&mut self, tables: impl IntoIterator<Item = Table>) {
        for table in tables {
            self.add(table);
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn finish(self) -> Vec<Table> {
        self.tables
    }
}
