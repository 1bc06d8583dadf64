//! SQLite-backed classification tables
//!
//! The ingestion pipeline writes one table per downloaded schedule file.
//! Every table shares one read connection.

use super::record::ScheduleRecord;
use super::table::Table;
use crate::config::ScheduleColumns;
use crate::error::Result;
use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to the schedule database
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open the schedule database read-only; a missing file is an error
pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<SharedConnection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// User tables in creation order
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY rowid",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Quote an identifier for interpolation into SQL
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One table of the schedule database
pub struct SqliteTable {
    name: String,
    columns: ScheduleColumns,
    conn: SharedConnection,
}

impl SqliteTable {
    pub fn new(conn: SharedConnection, name: impl Into<String>, columns: ScheduleColumns) -> Self {
        Self {
            name: name.into(),
            columns,
            conn,
        }
    }

    /// Lock the shared connection, recovering from poisoning; the handle is
    /// read-only so a panicked holder cannot leave it half-written.
    fn get_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configured code columns that this table actually has
    fn present_code_columns(&self, conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!(
            "PRAGMA table_info({})",
            quote_identifier(&self.name)
        ))?;
        let existing = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(self
            .columns
            .code
            .iter()
            .filter(|column| existing.contains(column))
            .cloned()
            .collect())
    }
}

impl Table for SqliteTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, code: &str) -> Result<Option<ScheduleRecord>> {
        let conn = self.get_conn();

        let code_columns = self.present_code_columns(&conn)?;
        if code_columns.is_empty() {
            debug!("Table {} has no classification code column, skipping", self.name);
            return Ok(None);
        }

        // instr() gives a literal, case-sensitive substring test; LIKE would
        // treat '_' in codes as a wildcard.
        let predicate = code_columns
            .iter()
            .map(|column| format!("instr({}, ?1) > 0", quote_identifier(column)))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT * FROM {} WHERE {} LIMIT 1",
            quote_identifier(&self.name),
            predicate
        );

        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query(params![code])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut values = BTreeMap::new();
        for (idx, name) in column_names.iter().enumerate() {
            if let Some(value) = value_to_text(row.get_ref(idx)?) {
                values.insert(name.clone(), value);
            }
        }

        Ok(Some(ScheduleRecord::from_columns(
            &self.name,
            values,
            &self.columns,
            code,
        )))
    }
}

fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}
