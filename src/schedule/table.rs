//! Table capability and the in-memory table

use super::record::ScheduleRecord;
use crate::config::ScheduleColumns;
use crate::error::Result;
use std::collections::BTreeMap;

/// One searchable classification table
pub trait Table: Send + Sync {
    /// Table name, used for logging and record provenance
    fn name(&self) -> &str;

    /// First row whose code column contains `code` as a substring.
    ///
    /// A table without any configured code column yields `Ok(None)`.
    fn search(&self, code: &str) -> Result<Option<ScheduleRecord>>;
}

/// Table held in memory as ordered rows of column->value maps
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    columns: ScheduleColumns,
    rows: Vec<BTreeMap<String, String>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, columns: ScheduleColumns) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row given as (column, value) pairs
    pub fn push_row<K, V, I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rows
            .push(row.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
    }

    /// Builder form of [`push_row`](Self::push_row)
    pub fn with_row<K, V, I>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.push_row(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_matches(&self, row: &BTreeMap<String, String>, code: &str) -> bool {
        self.columns
            .code
            .iter()
            .filter_map(|column| row.get(column))
            .any(|value| value.contains(code))
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, code: &str) -> Result<Option<ScheduleRecord>> {
        let found = self
            .rows
            .iter()
            .find(|row| self.row_matches(row, code))
            .map(|row| {
                ScheduleRecord::from_columns(&self.name, row.clone(), &self.columns, code)
            });
        Ok(found)
    }
}
