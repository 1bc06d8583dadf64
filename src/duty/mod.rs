//! Duty engine for single-shipment calculations

mod result;
mod engine;
mod report;

pub use result::{
    CostBreakdown, DutyResult, NOT_FOUND_DESCRIPTION, UNKNOWN_DUTY_TYPE, UNKNOWN_RATE_TEXT,
};
pub use engine::{duty_amount, DutyEngine, DEFAULT_RATE_TEXT};
pub use report::{format_report, ReportSummary, DUTY_AMOUNT_LABEL, TOTAL_LANDED_COST_LABEL};
