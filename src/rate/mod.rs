//! Duty-rate normalization

mod parser;

pub use parser::{parse_rate, Rate, RateKind};
