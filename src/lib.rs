//! Tariff Duty - import duty and landed cost calculation
//!
//! This library provides:
//! - Normalization of schedule duty-rate text into typed rates
//! - First-match classification code lookup across schedule tables
//! - Duty amount, CIF value and landed cost calculation
//! - Batch calculation with per-row error isolation and parallel execution

pub mod config;
pub mod error;
pub mod rate;
pub mod schedule;
pub mod shipment;
pub mod duty;
pub mod batch;
pub mod assistant;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{DutyError, Result};
pub use rate::{parse_rate, Rate, RateKind};
pub use schedule::{Schedule, ScheduleLookup, ScheduleRecord, Table};
pub use shipment::{RawShipmentRow, ShipmentInput};
pub use duty::{format_report, DutyEngine, DutyResult};
pub use batch::{BatchReport, BatchRunner, CancellationToken};
