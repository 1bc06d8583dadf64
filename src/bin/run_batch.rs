//! Run duty calculations for every row of a batch CSV
//!
//! Usage: run_batch [input.csv] [output.csv]

use anyhow::Context;
use std::time::Instant;
use tariff_duty::batch::BatchRunner;
use tariff_duty::shipment::load_batch_rows;
use tariff_duty::{DutyEngine, EngineConfig};

const DEFAULT_INPUT: &str = "hts_batch.csv";
const DEFAULT_OUTPUT: &str = "duty_calculations_results.csv";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let output_path = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let start = Instant::now();
    let config = EngineConfig::from_env();

    println!("Loading shipments from {}...", input_path);
    let rows = load_batch_rows(&input_path)
        .with_context(|| format!("failed to load batch file {}", input_path))?;
    println!("Loaded {} rows in {:?}", rows.len(), start.elapsed());

    let runner = BatchRunner::new(DutyEngine::from_config(&config), &config);

    println!("Running calculations...");
    let calc_start = Instant::now();
    let report = runner.run(&rows);
    println!("Calculations complete in {:?}", calc_start.elapsed());

    report
        .write_csv_path(&output_path)
        .with_context(|| format!("failed to write {}", output_path))?;
    println!("Output written to {}", output_path);

    let summary = report.summary();
    println!("\nBatch Summary:");
    println!("  Rows:              {}", summary.total_rows);
    println!("  Succeeded:         {}", summary.succeeded);
    println!("  Failed:            {}", summary.failed);
    println!("  Not found:         {}", summary.not_found);
    println!("  Total CIF Value:   ${:.2}", summary.total_cif_value);
    println!("  Total Duty:        ${:.2}", summary.total_duty);
    println!("  Total Landed Cost: ${:.2}", summary.total_landed_cost);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
