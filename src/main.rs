//! Tariff Duty CLI
//!
//! Runs a single duty calculation against the configured schedule store

use anyhow::Context;
use tariff_duty::{format_report, DutyEngine, EngineConfig, ShipmentInput};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Tariff Duty v0.1.0");
    println!("==================\n");

    let config = EngineConfig::from_env();
    println!("Schedule store: {}\n", config.database_path.display());

    let engine = DutyEngine::from_config(&config);

    // Purebred breeding horses, 10 head at 100 kg
    let shipment: ShipmentInput = "0101.21.00,1000.0,100.0,50.0,10,100.0"
        .parse()
        .context("invalid shipment entry")?;

    let result = engine.calculate(&shipment);
    println!("{}", format_report(&result));

    if !result.is_found() {
        println!("\nNo schedule record matched; check that the schedule store has been populated.");
    }

    Ok(())
}
