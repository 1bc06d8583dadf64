//! Duty calculation output structures

use crate::rate::RateKind;
use serde::{Deserialize, Serialize};

/// Description reported when no schedule record matches
pub const NOT_FOUND_DESCRIPTION: &str = "HTS code not found";

/// Rate text reported when no schedule record matches
pub const UNKNOWN_RATE_TEXT: &str = "Unknown";

/// Duty type label used when no rate could be resolved
pub const UNKNOWN_DUTY_TYPE: &str = "unknown";

/// Named cost components of a calculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub product_cost: f64,
    pub freight: f64,
    pub insurance: f64,
    pub cif_value: f64,
    pub duty_amount: f64,
    pub total_landed_cost: f64,
}

impl CostBreakdown {
    /// Build from the input costs and duty; CIF and total are derived
    pub fn new(product_cost: f64, freight: f64, insurance: f64, duty_amount: f64) -> Self {
        let cif_value = product_cost + freight + insurance;
        Self {
            product_cost,
            freight,
            insurance,
            cif_value,
            duty_amount,
            total_landed_cost: cif_value + duty_amount,
        }
    }

    /// Components as (name, value) pairs in report order
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("product_cost", self.product_cost),
            ("freight", self.freight),
            ("insurance", self.insurance),
            ("cif_value", self.cif_value),
            ("duty_amount", self.duty_amount),
            ("total_landed_cost", self.total_landed_cost),
        ]
    }

    /// Look up a component by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Result of a single duty calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyResult {
    /// Classification code as requested
    pub hts_code: String,

    /// Product description from the schedule, or the not-found sentinel
    pub product_description: String,

    /// Cost + freight + insurance
    pub cif_value: f64,

    /// Rate expression as written in the schedule
    pub duty_rate: String,

    pub duty_amount: f64,

    /// CIF value + duty amount
    pub total_landed_cost: f64,

    /// Resolved rate kind; `None` when the code was not found
    pub rate_kind: Option<RateKind>,

    pub breakdown: CostBreakdown,
}

impl DutyResult {
    /// Zero-valued result for a code absent from every table
    pub fn not_found(hts_code: &str) -> Self {
        Self {
            hts_code: hts_code.to_string(),
            product_description: NOT_FOUND_DESCRIPTION.to_string(),
            cif_value: 0.0,
            duty_rate: UNKNOWN_RATE_TEXT.to_string(),
            duty_amount: 0.0,
            total_landed_cost: 0.0,
            rate_kind: None,
            breakdown: CostBreakdown::default(),
        }
    }

    /// Whether the code matched a schedule record
    pub fn is_found(&self) -> bool {
        self.rate_kind.is_some()
    }

    /// Rate kind label, "unknown" when not found
    pub fn duty_type(&self) -> &'static str {
        self.rate_kind
            .map(|kind| kind.as_str())
            .unwrap_or(UNKNOWN_DUTY_TYPE)
    }
}
