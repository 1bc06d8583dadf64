//! Fixed-layout text report for a single calculation
//!
//! Downstream consumers re-read this text by label ("Duty Amount:",
//! "Total Landed Cost:"), so labels and the `label: value` shape are stable.

use super::result::DutyResult;

pub const DUTY_AMOUNT_LABEL: &str = "Duty Amount:";
pub const TOTAL_LANDED_COST_LABEL: &str = "Total Landed Cost:";

/// Render the human-readable report; currency values carry two decimals
pub fn format_report(result: &DutyResult) -> String {
    let b = &result.breakdown;
    format!(
        "HTS Code: {}\n\
         Product: {}\n\
         \n\
         Cost Breakdown:\n\
         - Product Cost: ${:.2}\n\
         - Freight: ${:.2}\n\
         - Insurance: ${:.2}\n\
         - CIF Value: ${:.2}\n\
         \n\
         Duty Calculation:\n\
         - Duty Rate: {}\n\
         - Duty Type: {}\n\
         - {} ${:.2}\n\
         \n\
         {} ${:.2}",
        result.hts_code,
        result.product_description,
        b.product_cost,
        b.freight,
        b.insurance,
        b.cif_value,
        result.duty_rate,
        result.duty_type(),
        DUTY_AMOUNT_LABEL,
        result.duty_amount,
        TOTAL_LANDED_COST_LABEL,
        result.total_landed_cost,
    )
}

/// Values recovered from a rendered report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSummary {
    pub duty_amount: f64,
    pub total_landed_cost: f64,
}

impl ReportSummary {
    /// Extract duty amount and total landed cost by label; `None` if either
    /// label is missing or its value does not parse.
    pub fn parse(report: &str) -> Option<Self> {
        let mut duty_amount = None;
        let mut total_landed_cost = None;

        for line in report.lines() {
            if let Some(value) = value_after(line, DUTY_AMOUNT_LABEL) {
                duty_amount = Some(value);
            } else if let Some(value) = value_after(line, TOTAL_LANDED_COST_LABEL) {
                total_landed_cost = Some(value);
            }
        }

        Some(Self {
            duty_amount: duty_amount?,
            total_landed_cost: total_landed_cost?,
        })
    }
}

fn value_after(line: &str, label: &str) -> Option<f64> {
    let (_, rest) = line.split_once(label)?;
    rest.trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duty::result::CostBreakdown;
    use crate::rate::RateKind;

    fn horses() -> DutyResult {
        let breakdown = CostBreakdown::new(1000.0, 100.0, 50.0, 57.5);
        DutyResult {
            hts_code: "0101.21.00".to_string(),
            product_description: "Purebred breeding horses".to_string(),
            cif_value: breakdown.cif_value,
            duty_rate: "5%".to_string(),
            duty_amount: breakdown.duty_amount,
            total_landed_cost: breakdown.total_landed_cost,
            rate_kind: Some(RateKind::Percentage),
            breakdown,
        }
    }

    #[test]
    fn test_layout() {
        let expected = "\
HTS Code: 0101.21.00
Product: Purebred breeding horses

Cost Breakdown:
- Product Cost: $1000.00
- Freight: $100.00
- Insurance: $50.00
- CIF Value: $1150.00

Duty Calculation:
- Duty Rate: 5%
- Duty Type: percentage
- Duty Amount: $57.50

Total Landed Cost: $1207.50";
        assert_eq!(format_report(&horses()), expected);
    }

    #[test]
    fn test_not_found_report() {
        let text = format_report(&DutyResult::not_found("9999"));
        assert!(text.contains("Product: HTS code not found"));
        assert!(text.contains("- Duty Type: unknown"));
        assert!(text.contains("- CIF Value: $0.00"));
    }

    #[test]
    fn test_parse_back() {
        let summary = ReportSummary::parse(&format_report(&horses())).unwrap();
        assert_eq!(summary.duty_amount, 57.5);
        assert_eq!(summary.total_landed_cost, 1207.5);
    }

    #[test]
    fn test_parse_missing_label() {
        assert!(ReportSummary::parse("Duty Amount: $1.00").is_none());
        assert!(ReportSummary::parse("Error calculating duty").is_none());
    }
}
