//! Load batch shipment rows from CSV
//!
//! Rows are kept as raw text so that one malformed row becomes a per-row
//! error in the batch report instead of failing the whole file.

use super::data::{parse_amount, parse_quantity, ShipmentInput, DEFAULT_ORIGIN};
use crate::error::{DutyError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every batch file must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "hts_code",
    "cost",
    "freight",
    "insurance",
    "quantity",
    "unit_weight",
];

/// Optional origin column
pub const ORIGIN_COLUMN: &str = "country_of_origin";

/// A batch row as read, before numeric conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawShipmentRow {
    pub hts_code: String,
    pub cost: String,
    pub freight: String,
    pub insurance: String,
    pub quantity: String,
    pub unit_weight: String,
    #[serde(default)]
    pub country_of_origin: Option<String>,
}

impl RawShipmentRow {
    /// Convert into a validated shipment, naming the offending field on error
    pub fn to_input(&self) -> Result<ShipmentInput> {
        let input = ShipmentInput::new(
            self.hts_code.as_str(),
            parse_amount("cost", &self.cost)?,
            parse_amount("freight", &self.freight)?,
            parse_amount("insurance", &self.insurance)?,
            parse_quantity(&self.quantity)?,
            parse_amount("unit_weight", &self.unit_weight)?,
        )?;

        let origin = self
            .country_of_origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(DEFAULT_ORIGIN);
        Ok(input.with_origin(origin))
    }
}

impl From<&ShipmentInput> for RawShipmentRow {
    fn from(input: &ShipmentInput) -> Self {
        Self {
            hts_code: input.hts_code.clone(),
            cost: input.cost.to_string(),
            freight: input.freight.to_string(),
            insurance: input.insurance.to_string(),
            quantity: input.quantity.to_string(),
            unit_weight: input.unit_weight.to_string(),
            country_of_origin: Some(input.country_of_origin.clone()),
        }
    }
}

/// Header positions of the batch columns
struct ColumnIndex {
    required: [usize; 6],
    origin: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut required = [0; 6];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = position(name).ok_or_else(|| DutyError::MissingColumn(name.to_string()))?;
        }

        Ok(Self {
            required,
            origin: position(ORIGIN_COLUMN),
        })
    }

    fn row(&self, record: &StringRecord) -> RawShipmentRow {
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        RawShipmentRow {
            hts_code: field(self.required[0]),
            cost: field(self.required[1]),
            freight: field(self.required[2]),
            insurance: field(self.required[3]),
            quantity: field(self.required[4]),
            unit_weight: field(self.required[5]),
            country_of_origin: self
                .origin
                .and_then(|idx| record.get(idx))
                .filter(|o| !o.trim().is_empty())
                .map(String::from),
        }
    }
}

/// Load batch rows from any reader. Extra columns are ignored.
pub fn load_batch_rows_from_reader<R: Read>(reader: R) -> Result<Vec<RawShipmentRow>> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let index = ColumnIndex::from_headers(csv_reader.headers()?)?;

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(index.row(&record));
    }

    Ok(rows)
}

/// Load batch rows from a CSV file
pub fn load_batch_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawShipmentRow>> {
    load_batch_rows_from_reader(File::open(path)?)
}
