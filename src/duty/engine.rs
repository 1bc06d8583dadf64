//! Core duty engine: lookup, rate normalization and duty arithmetic

use super::result::{CostBreakdown, DutyResult};
use crate::config::EngineConfig;
use crate::rate::{parse_rate, Rate, RateKind};
use crate::schedule::{Schedule, ScheduleLookup};
use crate::shipment::ShipmentInput;
use log::debug;

/// Rate text assumed when a matched record has no rate column
pub const DEFAULT_RATE_TEXT: &str = "Free";

/// Duty owed under `rate` for the given dutiable quantities.
///
/// - Free: 0
/// - Percentage: value% of CIF
/// - CentsPerKilogram: value cents per kg of total shipment weight
/// - DollarsPerUnit: value dollars per unit
pub fn duty_amount(rate: &Rate, cif_value: f64, quantity: u32, unit_weight: f64) -> f64 {
    match rate.kind {
        RateKind::Free => 0.0,
        RateKind::Percentage => rate.value / 100.0 * cif_value,
        RateKind::CentsPerKilogram => {
            let total_weight = quantity as f64 * unit_weight;
            rate.value / 100.0 * total_weight
        }
        RateKind::DollarsPerUnit => rate.value * quantity as f64,
    }
}

/// Duty engine over a schedule lookup
pub struct DutyEngine<L = Schedule> {
    lookup: L,
}

impl DutyEngine<Schedule> {
    /// Engine over the SQLite schedule named in `config`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Schedule::open_sqlite(config))
    }
}

impl<L: ScheduleLookup> DutyEngine<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Calculate duty and landed cost for one shipment. Never fails.
    pub fn calculate(&self, input: &ShipmentInput) -> DutyResult {
        let Some(record) = self.lookup.find(&input.hts_code) else {
            debug!("No schedule record for {}", input.hts_code);
            return DutyResult::not_found(&input.hts_code);
        };

        let rate_text = record
            .rate_text
            .unwrap_or_else(|| DEFAULT_RATE_TEXT.to_string());
        let rate = parse_rate(Some(rate_text.as_str()));

        let cif_value = input.cif_value();
        let duty = duty_amount(&rate, cif_value, input.quantity, input.unit_weight);
        let breakdown = CostBreakdown::new(input.cost, input.freight, input.insurance, duty);

        debug!(
            "{} -> {} ({}: {}), duty {:.2}",
            input.hts_code, record.code, rate.kind, rate.value, duty
        );

        DutyResult {
            hts_code: input.hts_code.clone(),
            product_description: record.description,
            cif_value: breakdown.cif_value,
            duty_rate: rate_text,
            duty_amount: breakdown.duty_amount,
            total_landed_cost: breakdown.total_landed_cost,
            rate_kind: Some(rate.kind),
            breakdown,
        }
    }
}
