//! End-to-end duty calculations against an on-disk schedule store

use approx::assert_relative_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tariff_duty::batch::BatchRunner;
use tariff_duty::duty::ReportSummary;
use tariff_duty::schedule::loader::import_csv_files;
use tariff_duty::shipment::load_batch_rows;
use tariff_duty::{
    format_report, DutyEngine, EngineConfig, RateKind, Schedule, ScheduleLookup, ShipmentInput,
};

const CHAPTER_01: &str = "\
HTS Code,Product Description,Duty Rate
0101.21.00,Purebred breeding horses,5%
0101.29.00,Other horses,25¢/kg
0101.30.00,Asses,$2.50 each
";

const CHAPTER_01_DETAIL: &str = "\
hts_number,product_description,duty_rate
0101.21.00.10,Purebred breeding horses: male,Free
";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn store(dir: &Path) -> EngineConfig {
    let db_path = dir.join("hts_data.db");
    let files = vec![
        write(dir, "chapter_01.csv", CHAPTER_01),
        write(dir, "chapter_01_detail.csv", CHAPTER_01_DETAIL),
    ];
    import_csv_files(&db_path, &files).unwrap();

    EngineConfig {
        database_path: db_path,
        ..EngineConfig::default()
    }
}

#[test]
fn test_single_calculation_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = store(dir.path());
    let engine = DutyEngine::from_config(&config);

    let input: ShipmentInput = "0101.21.00,1000,100,50,10,100".parse().unwrap();
    let result = engine.calculate(&input);

    assert_eq!(result.rate_kind, Some(RateKind::Percentage));
    assert_relative_eq!(result.cif_value, 1150.0);
    assert_relative_eq!(result.duty_amount, 57.5);
    assert_relative_eq!(result.total_landed_cost, 1207.5);

    let report = format_report(&result);
    assert!(report.contains("Product: Purebred breeding horses"));
    let summary = ReportSummary::parse(&report).unwrap();
    assert_relative_eq!(summary.duty_amount, 57.5);
    assert_relative_eq!(summary.total_landed_cost, 1207.5);
}

#[test]
fn test_first_table_wins() {
    let dir = tempfile::tempdir().unwrap();
    let config = store(dir.path());
    let schedule = Schedule::open_sqlite(&config);

    assert_eq!(schedule.table_names(), vec!["chapter_01", "chapter_01_detail"]);

    // Both tables contain a row matching "0101.21"; the first registered wins
    let record = schedule.find("0101.21").unwrap();
    assert_eq!(record.table, "chapter_01");
    assert_eq!(record.rate_text.as_deref(), Some("5%"));

    // Only the detail table has this code
    let record = schedule.find("0101.21.00.10").unwrap();
    assert_eq!(record.table, "chapter_01_detail");
    assert_eq!(record.code, "0101.21.00.10");
}

#[test]
fn test_weight_and_unit_rates() {
    let dir = tempfile::tempdir().unwrap();
    let engine = DutyEngine::from_config(&store(dir.path()));

    let by_weight = engine.calculate(&"0101.29.00,1000,0,0,10,100".parse().unwrap());
    assert_eq!(by_weight.rate_kind, Some(RateKind::CentsPerKilogram));
    assert_relative_eq!(by_weight.duty_amount, 250.0);

    let by_unit = engine.calculate(&"0101.30.00,1000,0,0,10,100".parse().unwrap());
    assert_eq!(by_unit.rate_kind, Some(RateKind::DollarsPerUnit));
    assert_relative_eq!(by_unit.duty_amount, 25.0);
}

#[test]
fn test_unknown_code_and_missing_store() {
    let dir = tempfile::tempdir().unwrap();
    let input: ShipmentInput = "9999.99.99,1000,100,50,10,100".parse().unwrap();

    let engine = DutyEngine::from_config(&store(dir.path()));
    let result = engine.calculate(&input);
    assert_eq!(result.product_description, "HTS code not found");
    assert_eq!(result.cif_value, 0.0);
    assert_eq!(result.total_landed_cost, 0.0);

    // Store that does not exist: still answers, everything not found
    let config = EngineConfig {
        database_path: dir.path().join("missing.db"),
        ..EngineConfig::default()
    };
    let engine = DutyEngine::from_config(&config);
    let result = engine.calculate(&"0101.21.00,1000,100,50,10,100".parse().unwrap());
    assert!(!result.is_found());
    assert_eq!(result.duty_amount, 0.0);
}

#[test]
fn test_batch_file_to_results_csv() {
    let dir = tempfile::tempdir().unwrap();
    let config = store(dir.path());

    let batch = write(
        dir.path(),
        "batch.csv",
        "hts_code,cost,freight,insurance,quantity,unit_weight,country_of_origin\n\
         0101.21.00,1000,100,50,10,100,CN\n\
         0101.29.00,n/a,100,50,10,100,MX\n\
         0101.30.00,2000,200,100,5,200,DE\n",
    );
    let rows = load_batch_rows(&batch).unwrap();

    let runner = BatchRunner::new(DutyEngine::from_config(&config), &config);
    let report = runner.run(&rows);

    assert_eq!(report.len(), 3);
    assert!(report.rows[1].outcome.is_failed());
    assert_relative_eq!(
        report.rows[0].outcome.result().unwrap().total_landed_cost,
        1207.5
    );
    assert_relative_eq!(report.rows[2].outcome.result().unwrap().duty_amount, 12.5);

    let out_path = dir.path().join("results.csv");
    report.write_csv_path(&out_path).unwrap();
    let written = fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[2].starts_with("0101.29.00,n/a,0.0,0.0,0.0,"));
}
