//! File output for simulation results.

/// Ledger and report CSV writers.
pub mod export;

pub use export::{export_ledger_csv, export_report_csv, write_ledger_csv, write_report_csv};
