//! Shipment inputs and batch file loading

mod data;
pub mod loader;

pub use data::{ShipmentInput, DEFAULT_ORIGIN};
pub use loader::{load_batch_rows, load_batch_rows_from_reader, RawShipmentRow};
