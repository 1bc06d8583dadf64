//! Classification schedule store and code lookup
//!
//! A [`Schedule`] owns an ordered list of [`Table`]s. Lookup is first-match:
//! tables are scanned in registration order and the first row whose code
//! column contains the requested code wins, even if a later table holds a
//! more specific row.

mod record;
mod table;
mod sqlite;
pub mod loader;

pub use record::{ScheduleRecord, UNKNOWN_DESCRIPTION};
pub use table::{MemoryTable, Table};
pub use sqlite::{list_tables, open_read_only, SharedConnection, SqliteTable};

use crate::config::{EngineConfig, ScheduleColumns};
use crate::error::{DutyError, Result};
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;

/// Read interface the duty engine depends on
pub trait ScheduleLookup: Send + Sync {
    /// First record whose code contains `code`; `None` when nothing matches
    /// or the store cannot be read.
    fn find(&self, code: &str) -> Option<ScheduleRecord>;
}

/// Ordered collection of classification tables
#[derive(Default)]
pub struct Schedule {
    tables: Vec<Box<dyn Table>>,
}

impl Schedule {
    /// Empty schedule; every lookup is not-found
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table after those already present
    pub fn add_table<T: Table + 'static>(&mut self, table: T) {
        self.tables.push(Box::new(table));
    }

    pub fn with_table<T: Table + 'static>(mut self, table: T) -> Self {
        self.add_table(table);
        self
    }

    /// Open every table of the configured SQLite store.
    ///
    /// An unreadable store gives an empty schedule so calculations still run
    /// and report not-found.
    pub fn open_sqlite(config: &EngineConfig) -> Self {
        match Self::try_open_sqlite(&config.database_path, &config.columns) {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(
                    "Schedule store {} unavailable, all lookups will be not-found: {}",
                    config.database_path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Open every table of a SQLite store, failing if it cannot be read
    pub fn try_open_sqlite<P: AsRef<Path>>(path: P, columns: &ScheduleColumns) -> Result<Self> {
        let conn = open_read_only(&path)?;
        let names = {
            let guard = conn
                .lock()
                .map_err(|e| DutyError::Lock(e.to_string()))?;
            list_tables(&guard)?
        };

        let mut schedule = Self::new();
        for name in names {
            schedule.add_table(SqliteTable::new(conn.clone(), name, columns.clone()));
        }
        info!(
            "Opened schedule {} with {} tables",
            path.as_ref().display(),
            schedule.len()
        );
        Ok(schedule)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ScheduleLookup for Schedule {
    fn find(&self, code: &str) -> Option<ScheduleRecord> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }

        for table in &self.tables {
            match table.search(code) {
                Ok(Some(record)) => {
                    debug!("Code {} matched {} in table {}", code, record.code, table.name());
                    return Some(record);
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Lookup of {} failed on table {}, treating as not found: {}",
                        code,
                        table.name(),
                        e
                    );
                    return None;
                }
            }
        }
        None
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("tables", &self.table_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenTable;

    impl Table for BrokenTable {
        fn name(&self) -> &str {
            "broken"
        }

        fn search(&self, _code: &str) -> Result<Option<ScheduleRecord>> {
            Err(DutyError::Lock("poisoned".to_string()))
        }
    }

    fn table(name: &str, code: &str, description: &str) -> MemoryTable {
        MemoryTable::new(name, ScheduleColumns::default()).with_row([
            ("hts_code", code),
            ("product_description", description),
            ("duty_rate", "5%"),
        ])
    }

    #[test]
    fn test_first_table_wins_over_more_specific_match() {
        let schedule = Schedule::new()
            .with_table(table("chapter_01_broad", "0101", "Horses, asses, mules"))
            .with_table(table("chapter_01_detail", "0101.21.00", "Purebred breeding horses"));

        let record = schedule.find("0101").unwrap();
        assert_eq!(record.table, "chapter_01_broad");
        assert_eq!(record.description, "Horses, asses, mules");
    }

    #[test]
    fn test_later_table_searched_when_earlier_misses() {
        let schedule = Schedule::new()
            .with_table(table("chapter_02", "0201.10.05", "Beef carcasses"))
            .with_table(table("chapter_01", "0101.21.00", "Purebred breeding horses"));

        assert_eq!(schedule.find("0101.21").unwrap().table, "chapter_01");
    }

    #[test]
    fn test_empty_schedule_and_blank_code() {
        assert!(Schedule::new().find("0101").is_none());

        let schedule = Schedule::new().with_table(table("t", "0101.21.00", "Horses"));
        assert!(schedule.find("   ").is_none());
    }

    #[test]
    fn test_store_failure_degrades_to_not_found() {
        let schedule = Schedule::new()
            .with_table(BrokenTable)
            .with_table(table("chapter_01", "0101.21.00", "Horses"));
        assert!(schedule.find("0101").is_none());
    }

    #[test]
    fn test_missing_database_gives_empty_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            database_path: dir.path().join("absent.db"),
            ..EngineConfig::default()
        };

        let schedule = Schedule::open_sqlite(&config);
        assert!(schedule.is_empty());
        assert!(schedule.find("0101").is_none());
    }
}
