//! Shipment input structures

use crate::error::{DutyError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Origin assumed when an entry does not name one
pub const DEFAULT_ORIGIN: &str = "CN";

/// One unit of work for the duty engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentInput {
    /// Classification code to look up
    pub hts_code: String,

    /// Product cost
    pub cost: f64,

    /// Freight cost
    pub freight: f64,

    /// Insurance cost
    pub insurance: f64,

    /// Number of units (at least 1)
    pub quantity: u32,

    /// Weight of a single unit in kilograms
    pub unit_weight: f64,

    /// Country of origin code; informational only
    #[serde(default = "default_origin")]
    pub country_of_origin: String,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

impl ShipmentInput {
    /// Create a validated shipment.
    ///
    /// Amounts and weight must be finite and non-negative and quantity
    /// positive. A blank code is allowed; it simply matches nothing.
    pub fn new(
        hts_code: impl Into<String>,
        cost: f64,
        freight: f64,
        insurance: f64,
        quantity: u32,
        unit_weight: f64,
    ) -> Result<Self> {
        let input = Self {
            hts_code: hts_code.into().trim().to_string(),
            cost,
            freight,
            insurance,
            quantity,
            unit_weight,
            country_of_origin: default_origin(),
        };
        input.validate()?;
        Ok(input)
    }

    /// Same shipment with a different origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.country_of_origin = origin.into();
        self
    }

    /// Check the invariants `new` enforces, for inputs built field by field
    pub fn validate(&self) -> Result<()> {
        check_amount("cost", self.cost)?;
        check_amount("freight", self.freight)?;
        check_amount("insurance", self.insurance)?;
        check_amount("unit_weight", self.unit_weight)?;
        if self.quantity == 0 {
            return Err(DutyError::InvalidField {
                field: "quantity",
                value: "0".to_string(),
                reason: "quantity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Cost + freight + insurance
    pub fn cif_value(&self) -> f64 {
        self.cost + self.freight + self.insurance
    }

    /// Quantity times unit weight, in kilograms
    pub fn total_weight(&self) -> f64 {
        self.quantity as f64 * self.unit_weight
    }
}

/// Parse the quick-entry form
/// `code,cost,freight,insurance,quantity,unit_weight[,origin]`
impl FromStr for ShipmentInput {
    type Err = DutyError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() < 6 {
            return Err(DutyError::MalformedEntry(format!(
                "expected 'hts_code,cost,freight,insurance,quantity,unit_weight', got {} fields",
                parts.len()
            )));
        }

        let input = Self::new(
            parts[0],
            parse_amount("cost", parts[1])?,
            parse_amount("freight", parts[2])?,
            parse_amount("insurance", parts[3])?,
            parse_quantity(parts[4])?,
            parse_amount("unit_weight", parts[5])?,
        )?;

        Ok(match parts.get(6).filter(|origin| !origin.is_empty()) {
            Some(origin) => input.with_origin(*origin),
            None => input,
        })
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DutyError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        });
    }
    Ok(())
}

/// Parse a monetary or weight field
pub(crate) fn parse_amount(field: &'static str, raw: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| DutyError::InvalidField {
        field,
        value: raw.to_string(),
        reason: "not a number".to_string(),
    })?;
    check_amount(field, value)?;
    Ok(value)
}

/// Parse a quantity; integral decimals such as "10.0" are accepted
pub(crate) fn parse_quantity(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| DutyError::InvalidField {
        field: "quantity",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let quantity = match trimmed.parse::<u32>() {
        Ok(q) => q,
        Err(_) => {
            let value: f64 = trimmed.parse().map_err(|_| invalid("not a number"))?;
            if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
                return Err(invalid("must be a whole number"));
            }
            value as u32
        }
    };

    if quantity == 0 {
        return Err(invalid("quantity must be at least 1"));
    }
    Ok(quantity)
}
