//! Schema difference calculator
//!
//! This module compares two schemas and calculates what has to change to turn
//! the first one into the second.

use crate::schema::column::Column;
use crate::schema::index::{ForeignKey, Index};
use crate::schema::types::{Schema, Table};

/// Default length assumed for variable-size columns declared without one
const DEFAULT_STRING_LENGTH: u32 = 255;

/// Changes needed to synchronize two schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub new_tables: Vec<Table>,
    pub dropped_tables: Vec<Table>,
    pub changed_tables: Vec<TableDiff>,
}

impl SchemaDiff {
    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.new_tables.is_empty() && self.dropped_tables.is_empty() && self.changed_tables.is_empty()
    }
}

/// Changes within a table present on both sides
#[derive(Debug, Clone)]
pub struct TableDiff {
    /// The table as it should look afterwards
    pub table: Table,
    pub added_columns: Vec<Column>,
    pub dropped_columns: Vec<Column>,
    pub changed_columns: Vec<ColumnDiff>,
    pub added_indexes: Vec<Index>,
    pub dropped_indexes: Vec<Index>,
    pub added_foreign_keys: Vec<ForeignKey>,
    pub dropped_foreign_keys: Vec<ForeignKey>,
}

impl TableDiff {
    fn new(table: Table) -> Self {
        Self {
            table,
            added_columns: Vec::new(),
            dropped_columns: Vec::new(),
            changed_columns: Vec::new(),
            added_indexes: Vec::new(),
            dropped_indexes: Vec::new(),
            added_foreign_keys: Vec::new(),
            dropped_foreign_keys: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.dropped_foreign_keys.is_empty()
    }
}

/// Column attribute that differs between two versions of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnProperty {
    Type,
    NotNull,
    Length,
    Precision,
    Scale,
    Default,
    Autoincrement,
    Unsigned,
    Fixed,
    Comment,
}

/// Represents a column change
#[derive(Debug, Clone)]
pub struct ColumnDiff {
    pub from: Column,
    pub to: Column,
    pub changed_properties: Vec<ColumnProperty>,
}

impl ColumnDiff {
    pub fn has_changed(&self, property: ColumnProperty) -> bool {
        self.changed_properties.contains(&property)
    }
}

/// Compares schemas, tables and columns
pub struct Comparator;

impl Comparator {
    /// Calculate the changes turning `from` into `to`
    pub fn compare_schemas(from: &Schema, to: &Schema) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for target in to.tables() {
            match from.table(target.name()) {
                None => diff.new_tables.push(target.clone()),
                Some(current) => {
                    if let Some(table_diff) = Self::compare_tables(current, target) {
                        diff.changed_tables.push(table_diff);
                    }
                }
            }
        }

        diff.dropped_tables = from
            .tables()
            .filter(|table| !to.has_table(table.name()))
            .cloned()
            .collect();

        diff
    }

    /// Calculate the changes within a table, `None` if both sides are equivalent
    pub fn compare_tables(from: &Table, to: &Table) -> Option<TableDiff> {
        let mut diff = TableDiff::new(to.clone());

        for column in to.columns() {
            match from.column(&column.name) {
                None => diff.added_columns.push(column.clone()),
                Some(current) => {
                    let changed_properties = Self::diff_column(current, column);
                    if !changed_properties.is_empty() {
                        diff.changed_columns.push(ColumnDiff {
                            from: current.clone(),
                            to: column.clone(),
                            changed_properties,
                        });
                    }
                }
            }
        }
        diff.dropped_columns = from
            .columns()
            .filter(|column| !to.has_column(&column.name))
            .cloned()
            .collect();

        for index in to.indexes() {
            match from.index(&index.name) {
                None => diff.added_indexes.push(index.clone()),
                Some(current) if Self::index_differs(current, index) => {
                    diff.dropped_indexes.push(current.clone());
                    diff.added_indexes.push(index.clone());
                }
                Some(_) => {}
            }
        }
        diff.dropped_indexes.extend(
            from.indexes()
                .filter(|index| !to.has_index(&index.name))
                .cloned(),
        );

        for fk in to.foreign_keys() {
            match from.foreign_key(&fk.name) {
                None => diff.added_foreign_keys.push(fk.clone()),
                Some(current) if Self::foreign_key_differs(current, fk) => {
                    diff.dropped_foreign_keys.push(current.clone());
                    diff.added_foreign_keys.push(fk.clone());
                }
                Some(_) => {}
            }
        }
        diff.dropped_foreign_keys.extend(
            from.foreign_keys()
                .filter(|fk| !to.has_foreign_key(&fk.name))
                .cloned(),
        );

        if diff.is_empty() {
            None
        } else {
            Some(diff)
        }
    }

    /// List the properties that differ between two columns
    pub fn diff_column(from: &Column, to: &Column) -> Vec<ColumnProperty> {
        let mut changed = Vec::new();

        if !from.type_name.eq_ignore_ascii_case(&to.type_name) {
            changed.push(ColumnProperty::Type);
        }
        if from.notnull != to.notnull {
            changed.push(ColumnProperty::NotNull);
        }
        if is_variable_size(&to.type_name) && effective_length(from) != effective_length(to) {
            changed.push(ColumnProperty::Length);
        }
        if is_decimal(&to.type_name) {
            if from.precision.unwrap_or(10) != to.precision.unwrap_or(10) {
                changed.push(ColumnProperty::Precision);
            }
            if from.scale.unwrap_or(0) != to.scale.unwrap_or(0) {
                changed.push(ColumnProperty::Scale);
            }
        }
        // Introspected defaults are strings, declared ones may be numbers or booleans
        let default_text = |c: &Column| c.default.as_ref().map(ToString::to_string);
        if default_text(from) != default_text(to) {
            changed.push(ColumnProperty::Default);
        }
        if from.autoincrement != to.autoincrement {
            changed.push(ColumnProperty::Autoincrement);
        }
        if from.unsigned != to.unsigned {
            changed.push(ColumnProperty::Unsigned);
        }
        if from.fixed != to.fixed {
            changed.push(ColumnProperty::Fixed);
        }
        if from.comment.as_deref().unwrap_or("") != to.comment.as_deref().unwrap_or("") {
            changed.push(ColumnProperty::Comment);
        }

        changed
    }

    fn index_differs(from: &Index, to: &Index) -> bool {
        !from.spans_columns(&to.columns)
            || from.is_unique != to.is_unique
            || from.is_primary != to.is_primary
    }

    fn foreign_key_differs(from: &ForeignKey, to: &ForeignKey) -> bool {
        let same_columns = |a: &[String], b: &[String]| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
        };

        !from.foreign_table.eq_ignore_ascii_case(&to.foreign_table)
            || !same_columns(&from.local_columns, &to.local_columns)
            || !same_columns(&from.foreign_columns, &to.foreign_columns)
            || action(from.on_delete()) != action(to.on_delete())
            || action(from.on_update()) != action(to.on_update())
    }
}

fn action(value: Option<&str>) -> Option<String> {
    value.map(str::to_uppercase)
}

fn is_variable_size(type_name: &str) -> bool {
    matches!(
        type_name.to_lowercase().as_str(),
        "string" | "ascii_string" | "binary"
    )
}

fn is_decimal(type_name: &str) -> bool {
    type_name.eq_ignore_ascii_case("decimal")
}

fn effective_length(column: &Column) -> u32 {
    column.length.unwrap_or(DEFAULT_STRING_LENGTH)
}
