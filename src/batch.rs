//! Batch runner for many shipments against one schedule
//!
//! Every row is computed independently. A row that fails (malformed numbers,
//! a panic inside the engine) is recorded as a failed outcome and the rest of
//! the batch continues. Output order always matches input order, including
//! when rows run in parallel.

use crate::config::EngineConfig;
use crate::duty::{DutyEngine, DutyResult};
use crate::error::Result;
use crate::schedule::{Schedule, ScheduleLookup};
use crate::shipment::{RawShipmentRow, ShipmentInput};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a running batch from starting further rows
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one batch row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Computed {
        input: ShipmentInput,
        result: DutyResult,
    },
    Failed {
        input: RawShipmentRow,
        error: String,
    },
}

impl BatchOutcome {
    pub fn result(&self) -> Option<&DutyResult> {
        match self {
            BatchOutcome::Computed { result, .. } => Some(result),
            BatchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BatchOutcome::Computed { .. } => None,
            BatchOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

/// A row outcome with its position in the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub index: usize,
    pub outcome: BatchOutcome,
}

/// One line of the batch output file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "HTS Code")]
    pub hts_code: String,
    #[serde(rename = "Product Cost")]
    pub product_cost: String,
    #[serde(rename = "CIF Value")]
    pub cif_value: f64,
    #[serde(rename = "Duty Amount")]
    pub duty_amount: f64,
    #[serde(rename = "Total Landed Cost")]
    pub total_landed_cost: f64,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl From<&BatchOutcome> for OutputRow {
    fn from(outcome: &BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Computed { input, result } => Self {
                hts_code: result.hts_code.clone(),
                product_cost: input.cost.to_string(),
                cif_value: result.cif_value,
                duty_amount: result.duty_amount,
                total_landed_cost: result.total_landed_cost,
                error: None,
            },
            BatchOutcome::Failed { input, error } => Self {
                hts_code: input.hts_code.clone(),
                product_cost: input.cost.clone(),
                cif_value: 0.0,
                duty_amount: 0.0,
                total_landed_cost: 0.0,
                error: Some(error.clone()),
            },
        }
    }
}

/// Ordered outcomes of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Outcomes in input order
    pub rows: Vec<BatchRow>,

    /// True when cancellation left some rows unstarted
    pub cancelled: bool,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.rows.iter().map(|row| &row.outcome)
    }

    /// Summary statistics over the completed rows
    pub fn summary(&self) -> BatchSummary {
        let results: Vec<&DutyResult> = self.outcomes().filter_map(BatchOutcome::result).collect();

        BatchSummary {
            total_rows: self.rows.len(),
            succeeded: results.len(),
            failed: self.outcomes().filter(|o| o.is_failed()).count(),
            not_found: results.iter().filter(|r| !r.is_found()).count(),
            total_cif_value: results.iter().map(|r| r.cif_value).sum(),
            total_duty: results.iter().map(|r| r.duty_amount).sum(),
            total_landed_cost: results.iter().map(|r| r.total_landed_cost).sum(),
        }
    }

    pub fn output_rows(&self) -> Vec<OutputRow> {
        self.outcomes().map(OutputRow::from).collect()
    }

    /// Write the output table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in self.output_rows() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(std::fs::File::create(path)?)
    }
}

/// Summary statistics for a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Computed rows whose code matched no schedule record
    pub not_found: usize,
    pub total_cif_value: f64,
    pub total_duty: f64,
    pub total_landed_cost: f64,
}

/// Runs the duty engine across a sequence of shipments
pub struct BatchRunner<L = Schedule> {
    engine: DutyEngine<L>,
    parallel: bool,
}

impl<L: ScheduleLookup> BatchRunner<L> {
    pub fn new(engine: DutyEngine<L>, config: &EngineConfig) -> Self {
        Self {
            engine,
            parallel: config.parallel,
        }
    }

    /// Runner that processes rows one at a time on the calling thread
    pub fn sequential(engine: DutyEngine<L>) -> Self {
        Self {
            engine,
            parallel: false,
        }
    }

    pub fn engine(&self) -> &DutyEngine<L> {
        &self.engine
    }

    /// Run raw rows (as loaded from a batch file)
    pub fn run(&self, rows: &[RawShipmentRow]) -> BatchReport {
        self.run_with_cancel(rows, &CancellationToken::new())
    }

    /// Run raw rows, stopping new rows once `cancel` is raised. Completed
    /// rows are still returned.
    pub fn run_with_cancel(
        &self,
        rows: &[RawShipmentRow],
        cancel: &CancellationToken,
    ) -> BatchReport {
        self.run_each(rows, cancel, |row| match row.to_input() {
            Ok(input) => self.compute(input, || row.clone()),
            Err(e) => BatchOutcome::Failed {
                input: row.clone(),
                error: e.to_string(),
            },
        })
    }

    /// Run already-typed shipments; each is validated first
    pub fn run_inputs(&self, inputs: &[ShipmentInput]) -> BatchReport {
        self.run_inputs_with_cancel(inputs, &CancellationToken::new())
    }

    pub fn run_inputs_with_cancel(
        &self,
        inputs: &[ShipmentInput],
        cancel: &CancellationToken,
    ) -> BatchReport {
        self.run_each(inputs, cancel, |input| match input.validate() {
            Ok(()) => self.compute(input.clone(), || RawShipmentRow::from(input)),
            Err(e) => BatchOutcome::Failed {
                input: RawShipmentRow::from(input),
                error: e.to_string(),
            },
        })
    }

    /// Calculate one row, turning a panic into a failed outcome
    fn compute<F>(&self, input: ShipmentInput, raw: F) -> BatchOutcome
    where
        F: FnOnce() -> RawShipmentRow,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.engine.calculate(&input))) {
            Ok(result) => BatchOutcome::Computed { input, result },
            Err(payload) => {
                let cause = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown cause".to_string());
                BatchOutcome::Failed {
                    input: raw(),
                    error: format!("calculation failed: {}", cause),
                }
            }
        }
    }

    fn run_each<T, F>(&self, items: &[T], cancel: &CancellationToken, process: F) -> BatchReport
    where
        T: Sync,
        F: Fn(&T) -> BatchOutcome + Sync,
    {
        let outcomes: Vec<Option<BatchOutcome>> = if self.parallel {
            items
                .par_iter()
                .map(|item| (!cancel.is_cancelled()).then(|| process(item)))
                .collect()
        } else {
            items
                .iter()
                .map_while(|item| (!cancel.is_cancelled()).then(|| Some(process(item))))
                .collect()
        };

        let rows: Vec<BatchRow> = outcomes
            .into_iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.map(|outcome| BatchRow { index, outcome }))
            .collect();

        for row in &rows {
            if let Some(error) = row.outcome.error() {
                warn!("Batch row {} failed: {}", row.index, error);
            }
        }

        let report = BatchReport {
            cancelled: rows.len() < items.len(),
            rows,
        };

        let summary = report.summary();
        if report.cancelled {
            info!(
                "Batch cancelled after {} of {} rows",
                summary.total_rows,
                items.len()
            );
        }
        info!(
            "Batch complete: {} rows, {} succeeded, {} failed, {} not found, total duty {:.2}",
            summary.total_rows,
            summary.succeeded,
            summary.failed,
            summary.not_found,
            summary.total_duty
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleColumns;
    use crate::schedule::{MemoryTable, ScheduleRecord};
    use approx::assert_relative_eq;

    fn schedule() -> Schedule {
        Schedule::new().with_table(
            MemoryTable::new("chapter_01", ScheduleColumns::default())
                .with_row([
                    ("hts_code", "0101.21.00"),
                    ("product_description", "Purebred breeding horses"),
                    ("duty_rate", "5%"),
                ])
                .with_row([
                    ("hts_code", "0102.90.40"),
                    ("product_description", "Live bovine animals"),
                    ("duty_rate", "$2.50"),
                ]),
        )
    }

    fn raw(code: &str, cost: &str) -> RawShipmentRow {
        RawShipmentRow {
            hts_code: code.to_string(),
            cost: cost.to_string(),
            freight: "100".to_string(),
            insurance: "50".to_string(),
            quantity: "10".to_string(),
            unit_weight: "100".to_string(),
            country_of_origin: None,
        }
    }

    fn mixed_rows() -> Vec<RawShipmentRow> {
        vec![
            raw("0101.21.00", "1000"),
            raw("0102.90.40", "abc"),
            raw("0102.90.40", "2000"),
            raw("9999.99.99", "10"),
        ]
    }

    fn check_mixed(report: &BatchReport) {
        assert_eq!(report.len(), 4);
        assert!(!report.cancelled);
        for (i, row) in report.rows.iter().enumerate() {
            assert_eq!(row.index, i);
        }

        let first = report.rows[0].outcome.result().unwrap();
        assert_relative_eq!(first.duty_amount, 57.5);

        let failed = &report.rows[1].outcome;
        assert!(failed.is_failed());
        assert!(failed.error().unwrap().contains("cost"));

        let third = report.rows[2].outcome.result().unwrap();
        assert_relative_eq!(third.duty_amount, 25.0);

        let missing = report.rows[3].outcome.result().unwrap();
        assert!(!missing.is_found());
    }

    #[test]
    fn test_mixed_batch_sequential() {
        let runner = BatchRunner::sequential(DutyEngine::new(schedule()));
        check_mixed(&runner.run(&mixed_rows()));
    }

    #[test]
    fn test_mixed_batch_parallel_preserves_order() {
        let runner = BatchRunner::new(DutyEngine::new(schedule()), &EngineConfig::default());
        let mut rows = Vec::new();
        for _ in 0..50 {
            rows.extend(mixed_rows());
        }

        let report = runner.run(&rows);
        assert_eq!(report.len(), 200);
        for chunk in report.rows.chunks(4) {
            let rebased = BatchReport {
                rows: chunk
                    .iter()
                    .enumerate()
                    .map(|(i, r)| BatchRow {
                        index: i,
                        outcome: r.outcome.clone(),
                    })
                    .collect(),
                cancelled: false,
            };
            check_mixed(&rebased);
        }
    }

    #[test]
    fn test_summary() {
        let runner = BatchRunner::sequential(DutyEngine::new(schedule()));
        let summary = runner.run(&mixed_rows()).summary();

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.not_found, 1);
        assert_relative_eq!(summary.total_duty, 82.5);
        assert_relative_eq!(summary.total_cif_value, 1150.0 + 2150.0);
    }

    #[test]
    fn test_cancelled_before_start_returns_empty_partial_report() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        for runner in [
            BatchRunner::sequential(DutyEngine::new(schedule())),
            BatchRunner::new(DutyEngine::new(schedule()), &EngineConfig::default()),
        ] {
            let report = runner.run_with_cancel(&mixed_rows(), &cancel);
            assert!(report.cancelled);
            assert!(report.is_empty());
        }
    }

    struct CancellingLookup {
        inner: Schedule,
        token: CancellationToken,
    }

    impl ScheduleLookup for CancellingLookup {
        fn find(&self, code: &str) -> Option<ScheduleRecord> {
            // Raise cancellation while the second row is being computed
            if code.starts_with("0102") {
                self.token.cancel();
            }
            self.inner.find(code)
        }
    }

    #[test]
    fn test_cancel_mid_batch_keeps_completed_rows() {
        let token = CancellationToken::new();
        let runner = BatchRunner::sequential(DutyEngine::new(CancellingLookup {
            inner: schedule(),
            token: token.clone(),
        }));

        let rows = vec![
            raw("0101.21.00", "1000"),
            raw("0102.90.40", "2000"),
            raw("0101.21.00", "3000"),
        ];
        let report = runner.run_with_cancel(&rows, &token);

        assert!(report.cancelled);
        assert_eq!(report.len(), 2);
        assert_eq!(report.rows[0].index, 0);
        assert_eq!(report.rows[1].index, 1);
        assert!(report.rows[1].outcome.result().is_some());
    }

    struct PanickingLookup;

    impl ScheduleLookup for PanickingLookup {
        fn find(&self, code: &str) -> Option<ScheduleRecord> {
            if code == "boom" {
                panic!("store exploded");
            }
            None
        }
    }

    #[test]
    fn test_panic_is_isolated_to_its_row() {
        let runner = BatchRunner::sequential(DutyEngine::new(PanickingLookup));
        let report = runner.run(&[raw("boom", "1"), raw("0101", "1")]);

        assert_eq!(report.len(), 2);
        assert!(report.rows[0]
            .outcome
            .error()
            .unwrap()
            .contains("store exploded"));
        assert!(report.rows[1].outcome.result().is_some());
    }

    #[test]
    fn test_typed_inputs_are_validated() {
        let mut bad = ShipmentInput::new("0101.21.00", 1.0, 0.0, 0.0, 1, 1.0).unwrap();
        bad.quantity = 0;
        let good = ShipmentInput::new("0101.21.00", 1000.0, 100.0, 50.0, 10, 100.0).unwrap();

        let runner = BatchRunner::sequential(DutyEngine::new(schedule()));
        let report = runner.run_inputs(&[bad, good]);

        assert!(report.rows[0].outcome.is_failed());
        match &report.rows[0].outcome {
            BatchOutcome::Failed { input, .. } => assert_eq!(input.quantity, "0"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_relative_eq!(report.rows[1].outcome.result().unwrap().total_landed_cost, 1207.5);
    }

    #[test]
    fn test_blank_code_is_not_found_rather_than_failed() {
        let runner = BatchRunner::sequential(DutyEngine::new(schedule()));
        let report = runner.run(&[raw("", "1000"), raw("   ", "1000")]);

        assert_eq!(report.len(), 2);
        for row in &report.rows {
            match &row.outcome {
                BatchOutcome::Computed { result, .. } => {
                    assert!(!result.is_found());
                    assert_eq!(result.total_landed_cost, 0.0);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(report.summary().not_found, 2);
        assert_eq!(report.summary().failed, 0);
    }

    #[test]
    fn test_csv_output() {
        let runner = BatchRunner::sequential(DutyEngine::new(schedule()));
        let report = runner.run(&mixed_rows());

        let mut buf = Vec::new();
        report.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "HTS Code,Product Cost,CIF Value,Duty Amount,Total Landed Cost,Error"
        );
        assert_eq!(lines[1], "0101.21.00,1000,1150.0,57.5,1207.5,");
        assert!(lines[2].starts_with("0102.90.40,abc,0.0,0.0,0.0,"));
        assert_eq!(lines[4], "9999.99.99,10,0.0,0.0,0.0,");
        assert_eq!(lines.len(), 5);
    }
}
