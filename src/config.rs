//! Engine configuration
//!
//! Built once at process start and passed by reference to the schedule,
//! the duty engine and the batch runner.

use crate::error::{DutyError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default location of the schedule database written by the ingestion pipeline
pub const DEFAULT_DATABASE_PATH: &str = "data/hts_data.db";

/// Environment variable overriding the database path
pub const DATABASE_PATH_ENV: &str = "TARIFF_DB_PATH";

/// Column names the schedule tables are read with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleColumns {
    /// Candidate classification-code columns, tried in order
    pub code: Vec<String>,

    /// Product description column
    pub description: String,

    /// Duty-rate expression column
    pub rate: String,
}

impl Default for ScheduleColumns {
    fn default() -> Self {
        Self {
            code: vec!["hts_code".to_string(), "hts_number".to_string()],
            description: "product_description".to_string(),
            rate: "duty_rate".to_string(),
        }
    }
}

/// Configuration for a calculation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the SQLite schedule store
    pub database_path: PathBuf,

    /// Schedule column naming
    pub columns: ScheduleColumns,

    /// Run batch rows on the rayon pool instead of sequentially
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            columns: ScheduleColumns::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file; omitted keys keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with the database path taken from `TARIFF_DB_PATH` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
            if !path.trim().is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }
        config
    }

    fn validate(&self) -> Result<()> {
        if self.columns.code.is_empty() {
            return Err(DutyError::Config(
                "at least one classification code column is required".to_string(),
            ));
        }
        if self.columns.rate.trim().is_empty() {
            return Err(DutyError::Config("rate column name is empty".to_string()));
        }
        Ok(())
    }
}
