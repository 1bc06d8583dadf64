//! Load classification CSV files into schedule tables
//!
//! Local half of ingestion: the files are assumed to be on disk already.
//! Headers are normalized (lowercase, spaces and hyphens become underscores)
//! and values of any duty/rate column are trimmed. Files carrying a
//! `country_code` column gain a `country_name` column.

use super::sqlite::quote_identifier;
use super::table::MemoryTable;
use crate::assistant::country_name;
use crate::config::ScheduleColumns;
use crate::error::{DutyError, Result};
use log::{info, warn};
use rusqlite::{params_from_iter, Connection};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// CSV contents after header normalization
#[derive(Debug, Clone, Default)]
pub struct NormalizedCsv {
    pub headers: Vec<String>,
    /// One value per header; empty cells are `None`
    pub rows: Vec<Vec<Option<String>>>,
}

/// Normalize a schedule column header
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Column whose values are expanded into country names
pub const COUNTRY_CODE_COLUMN: &str = "country_code";

/// Column added alongside [`COUNTRY_CODE_COLUMN`]
pub const COUNTRY_NAME_COLUMN: &str = "country_name";

fn is_rate_column(header: &str) -> bool {
    header.contains("duty") || header.contains("rate")
}

/// Append a country name column; unknown codes keep their raw value
fn add_country_names(csv: &mut NormalizedCsv) {
    if csv.headers.iter().any(|h| h == COUNTRY_NAME_COLUMN) {
        return;
    }
    let Some(code_idx) = csv.headers.iter().position(|h| h == COUNTRY_CODE_COLUMN) else {
        return;
    };

    csv.headers.push(COUNTRY_NAME_COLUMN.to_string());
    for row in &mut csv.rows {
        let name = row[code_idx]
            .as_deref()
            .map(|code| country_name(code).unwrap_or(code).to_string());
        row.push(name);
    }
}

/// Read and normalize a schedule CSV from any reader
pub fn read_normalized<R: Read>(reader: R) -> Result<NormalizedCsv> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();
    let trim_mask: Vec<bool> = headers.iter().map(|h| is_rate_column(h)).collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let row = (0..headers.len())
            .map(|idx| {
                let raw = record.get(idx).unwrap_or("");
                let value = if trim_mask[idx] { raw.trim() } else { raw };
                (!value.is_empty()).then(|| value.to_string())
            })
            .collect();
        rows.push(row);
    }

    let mut csv = NormalizedCsv { headers, rows };
    add_country_names(&mut csv);
    Ok(csv)
}

/// Derive a table name from a file path (its stem)
pub fn table_name_for(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            DutyError::Config(format!("cannot derive table name from {}", path.display()))
        })
}

/// Build an in-memory table from normalized CSV contents
pub fn memory_table(name: &str, csv: &NormalizedCsv, columns: &ScheduleColumns) -> MemoryTable {
    let mut table = MemoryTable::new(name, columns.clone());
    for row in &csv.rows {
        table.push_row(
            csv.headers
                .iter()
                .zip(row)
                .filter_map(|(header, value)| value.as_ref().map(|v| (header.clone(), v.clone()))),
        );
    }
    table
}

/// Load a schedule CSV file as an in-memory table named after the file
pub fn load_memory_table<P: AsRef<Path>>(
    path: P,
    columns: &ScheduleColumns,
) -> Result<MemoryTable> {
    let path = path.as_ref();
    let name = table_name_for(path)?;
    let csv = read_normalized(File::open(path)?)?;
    Ok(memory_table(&name, &csv, columns))
}

/// Write normalized CSV contents as a SQLite table, replacing any table of
/// the same name. Returns the number of rows written.
pub fn write_sqlite_table(conn: &mut Connection, name: &str, csv: &NormalizedCsv) -> Result<usize> {
    if csv.headers.is_empty() {
        return Err(DutyError::MissingColumn(format!("{} has no header row", name)));
    }

    let table = quote_identifier(name);
    let column_defs = csv
        .headers
        .iter()
        .map(|h| format!("{} TEXT", quote_identifier(h)))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=csv.headers.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    tx.execute(&format!("CREATE TABLE {} ({})", table, column_defs), [])?;
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
        for row in &csv.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;

    Ok(csv.rows.len())
}

/// Import each CSV file into the database at `db_path` (created if absent).
///
/// A file that fails to load is logged and skipped. Returns the tables
/// written with their row counts.
pub fn import_csv_files<P: AsRef<Path>>(
    db_path: P,
    files: &[PathBuf],
) -> Result<Vec<(String, usize)>> {
    let mut conn = Connection::open(db_path.as_ref())?;
    let mut written = Vec::new();

    for path in files {
        let imported = table_name_for(path).and_then(|name| {
            let csv = read_normalized(File::open(path)?)?;
            let count = write_sqlite_table(&mut conn, &name, &csv)?;
            Ok((name, count))
        });

        match imported {
            Ok((name, count)) => {
                info!("Created table {} ({} rows)", name, count);
                written.push((name, count));
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(written)
}
