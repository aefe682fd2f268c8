//! Column-oriented tables with an optional promoted row key.
//!
//! A table is replaced wholesale on every assignment; the operations here all
//! consume `self` and return a new table rather than editing in place.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::TableError;
use crate::lookup::Named;

/// Column label used when implicit row numbers are demoted into data.
pub const DEFAULT_INDEX_COLUMN: &str = "index";

/// One named column of row-aligned values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

impl Named for Column {
    fn name(&self) -> &str {
        &self.name
    }
}

/// How rows are keyed.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKey {
    /// Implicit row numbers `start..start + rows`.
    Range { start: usize },
    /// Columns promoted out of the value columns, in key order.
    Columns(Vec<Column>),
}

impl Default for RowKey {
    fn default() -> Self {
        RowKey::Range { start: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    key: RowKey,
    rows: usize,
}

/// True when the table's key is anything other than implicit `0..rows`
/// numbering. Computed from the current key every time.
pub fn has_user_defined_key(table: &Table) -> bool {
    match &table.key {
        RowKey::Range { start } => *start != 0,
        RowKey::Columns(_) => true,
    }
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from value columns with implicit row numbering.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        check_columns(&columns, rows)?;
        Ok(Self {
            columns,
            key: RowKey::default(),
            rows,
        })
    }

    /// Replace the row key. Key columns must match the row count and must not
    /// collide with value column names.
    pub fn with_key(mut self, key: RowKey) -> Result<Self, TableError> {
        if let RowKey::Columns(key_columns) = &key {
            check_columns(key_columns, self.rows)?;
            let names: HashSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
            if let Some(dup) = key_columns.iter().find(|c| names.contains(c.name.as_str())) {
                return Err(TableError::DuplicateColumn(dup.name.clone()));
            }
        }
        self.key = key;
        Ok(self)
    }

    /// Build a table from row records. Columns appear in first-seen order;
    /// keys missing from a record become `null`.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let columns = names
            .iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|record| record.get(*name).cloned().unwrap_or(Value::Null))
                    .collect();
                Column::new(*name, values)
            })
            .collect();

        Self {
            columns,
            key: RowKey::default(),
            rows: records.len(),
        }
    }

    /// Emit one record per row, key columns first. Implicit `0..rows`
    /// numbering is never written out.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let demoted = self.clone().demote_key();
        (0..demoted.rows)
            .map(|row| {
                demoted
                    .columns
                    .iter()
                    .map(|column| (column.name.clone(), column.values[row].clone()))
                    .collect()
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of columns including promoted key columns.
    pub fn width(&self) -> usize {
        self.columns.len() + self.key_columns().len()
    }

    /// No rows, or nothing to hold values in.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.width() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        crate::lookup::find_by_name(&self.columns, name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn key_columns(&self) -> &[Column] {
        match &self.key {
            RowKey::Columns(columns) => columns,
            RowKey::Range { .. } => &[],
        }
    }

    /// Move a user-defined key back into leading value columns.
    ///
    /// Implicit numbering starting at zero is dropped; any other implicit
    /// range becomes an [`DEFAULT_INDEX_COLUMN`] column.
    pub fn demote_key(self) -> Self {
        let Table { columns, key, rows } = self;
        let mut leading = match key {
            RowKey::Range { start: 0 } => return Table { columns, key: RowKey::default(), rows },
            RowKey::Range { start } => vec![Column::new(
                DEFAULT_INDEX_COLUMN,
                (start..start + rows).map(|n| Value::from(n as u64)).collect(),
            )],
            RowKey::Columns(key_columns) => key_columns,
        };
        leading.extend(columns);
        Table {
            columns: leading,
            key: RowKey::default(),
            rows,
        }
    }

    /// Promote the named value columns to the row key, in the given order.
    /// Any existing key is demoted first.
    pub fn promote_key(self, names: &[String]) -> Result<Self, TableError> {
        let mut table = self.demote_key();
        let mut key_columns = Vec::with_capacity(names.len());
        for name in names {
            let idx = table
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
            key_columns.push(table.columns.remove(idx));
        }
        table.key = if key_columns.is_empty() {
            RowKey::default()
        } else {
            RowKey::Columns(key_columns)
        };
        Ok(table)
    }

    /// Relabel value columns positionally.
    pub fn rename_columns(mut self, names: &[String]) -> Result<Self, TableError> {
        if names.len() != self.columns.len() {
            return Err(TableError::ColumnCount {
                expected: self.columns.len(),
                found: names.len(),
            });
        }
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name.clone();
        }
        Ok(self)
    }

    /// Reorder value columns to exactly `names`.
    pub fn select_columns(mut self, names: &[String]) -> Result<Self, TableError> {
        if names.len() != self.columns.len() {
            return Err(TableError::ColumnCount {
                expected: self.columns.len(),
                found: names.len(),
            });
        }
        let mut ordered = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
            ordered.push(self.columns.swap_remove(idx));
        }
        self.columns = ordered;
        Ok(self)
    }
}

fn check_columns(columns: &[Column], rows: usize) -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for column in columns {
        if column.values.len() != rows {
            return Err(TableError::ColumnLength {
                column: column.name.clone(),
                expected: rows,
                found: column.values.len(),
            });
        }
        if !seen.insert(column.name.as_str()) {
            return Err(TableError::DuplicateColumn(column.name.clone()));
        }
    }
    Ok(())
}
