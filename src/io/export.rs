//! CSV export for the energy ledger and the period report.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::post::{PeriodRow, PostProcessResult};
use crate::sim::types::EnergyLedger;

/// Column header of the hourly ledger export.
pub const LEDGER_HEADER: &str = "hour,demand,generation,self_consumed,exported,\
                                 imported_from_grid,curtailed,stored_delta";

/// Column header of the period report export.
pub const REPORT_HEADER: &str = "period,hours,demand,generation,self_consumed,\
                                 imported_from_grid,exported,curtailed,charged,discharged,\
                                 cost,cost_without_solar,savings,emissions_kg,\
                                 avoided_emissions_kg,cumulative_emissions_kg,\
                                 self_sufficiency,degenerate";

fn header_fields(header: &str) -> impl Iterator<Item = &str> {
    header.split(',').map(str::trim)
}

/// Exports the hourly ledger to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ledger_csv(ledger: &EnergyLedger, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_ledger_csv(ledger, io::BufWriter::new(file))
}

/// Writes the hourly ledger as CSV to any writer.
///
/// One header row, then one row per simulated hour in hour order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_ledger_csv(ledger: &EnergyLedger, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header_fields(LEDGER_HEADER))?;

    for r in ledger.rows() {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.6}", r.demand),
            format!("{:.6}", r.generation),
            format!("{:.6}", r.self_consumed),
            format!("{:.6}", r.exported),
            format!("{:.6}", r.imported_from_grid),
            format!("{:.6}", r.curtailed),
            format!("{:.6}", r.stored_delta),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the period report, with a trailing totals row, to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_report_csv(report: &PostProcessResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_report_csv(report, io::BufWriter::new(file))
}

/// Writes the period report as CSV to any writer.
///
/// Degenerate periods carry `NaN` in `self_sufficiency` and `true` in
/// `degenerate`. The last row holds the totals over all periods.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_report_csv(report: &PostProcessResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header_fields(REPORT_HEADER))?;

    let totals = report.totals();
    for r in report.rows().iter().chain(std::iter::once(&totals)) {
        wtr.write_record(report_record(r))?;
    }

    wtr.flush()?;
    Ok(())
}

fn report_record(r: &PeriodRow) -> [String; 18] {
    [
        r.period.clone(),
        r.hours.to_string(),
        format!("{:.4}", r.demand),
        format!("{:.4}", r.generation),
        format!("{:.4}", r.self_consumed),
        format!("{:.4}", r.imported_from_grid),
        format!("{:.4}", r.exported),
        format!("{:.4}", r.curtailed),
        format!("{:.4}", r.charged),
        format!("{:.4}", r.discharged),
        format!("{:.4}", r.cost),
        format!("{:.4}", r.cost_without_solar),
        format!("{:.4}", r.savings),
        format!("{:.4}", r.emissions_kg),
        format!("{:.4}", r.avoided_emissions_kg),
        format!("{:.4}", r.cumulative_emissions_kg),
        format!("{:.6}", r.self_sufficiency),
        r.degenerate.to_string(),
    ]
}
