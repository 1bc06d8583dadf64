//! Schedule record: known core fields plus the table's other columns

use crate::config::ScheduleColumns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Description used when a matched row has no description column
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// A single row of a classification table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Table the row was read from
    pub table: String,

    /// Classification code as stored in the schedule
    pub code: String,

    /// Free-text product description
    pub description: String,

    /// Raw duty-rate expression; `None` when the row has no rate column
    pub rate_text: Option<String>,

    /// All other columns, uninterpreted
    pub extra: BTreeMap<String, String>,
}

impl ScheduleRecord {
    /// Split a column->value row into core fields and extras.
    ///
    /// The code comes from the first code column containing `searched`,
    /// falling back to the first code column present. Columns with NULL
    /// values are expected to be absent from `columns`.
    pub fn from_columns(
        table: &str,
        mut columns: BTreeMap<String, String>,
        names: &ScheduleColumns,
        searched: &str,
    ) -> Self {
        let code = {
            let present: Vec<&String> =
                names.code.iter().filter_map(|name| columns.get(name)).collect();
            present
                .iter()
                .find(|value| value.contains(searched))
                .or(present.first())
                .map(|value| value.to_string())
                .unwrap_or_default()
        };
        let description = columns
            .remove(&names.description)
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
        let rate_text = columns.remove(&names.rate);

        for name in &names.code {
            columns.remove(name);
        }

        Self {
            table: table.to_string(),
            code,
            description,
            rate_text,
            extra: columns,
        }
    }

    /// Look up an uninterpreted column
    pub fn column(&self, name: &str) -> Option<&str> {
        self.extra.get(name).map(String::as_str)
    }
}
