//! Post-processing: period aggregation of the energy ledger into cost,
//! savings, emissions, and self-sufficiency.

use std::fmt;

use tracing::{info, warn};

use super::calendar::{PeriodKey, period_of};
use super::progress::RunControl;
use super::types::{EnergyLedger, LedgerRow};
use crate::config::RunConfig;
use crate::error::SimError;

/// Aggregates for one reporting period.
///
/// Field names are the column contract of the report table. Energies are
/// kWh, money is in tariff currency, emissions are kg CO2.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRow {
    /// `"YYYY-MM"` for monthly reports, `"YYYY"` for yearly ones.
    pub period: String,
    pub hours: usize,
    pub demand: f64,
    pub generation: f64,
    pub self_consumed: f64,
    pub imported_from_grid: f64,
    pub exported: f64,
    pub curtailed: f64,
    pub charged: f64,
    pub discharged: f64,
    /// `imported × import rate − exported × export rate`, per hour's band.
    pub cost: f64,
    /// Cost of buying all demand from the grid.
    pub cost_without_solar: f64,
    pub savings: f64,
    pub emissions_kg: f64,
    pub avoided_emissions_kg: f64,
    /// Emissions from the start of the horizon to the end of this period.
    pub cumulative_emissions_kg: f64,
    /// `self_consumed / (self_consumed + imported)`; NaN when there was no demand.
    pub self_sufficiency: f64,
    /// Set when `self_sufficiency` is the NaN sentinel.
    pub degenerate: bool,
}

impl PeriodRow {
    fn empty(period: String) -> Self {
        Self {
            period,
            hours: 0,
            demand: 0.0,
            generation: 0.0,
            self_consumed: 0.0,
            imported_from_grid: 0.0,
            exported: 0.0,
            curtailed: 0.0,
            charged: 0.0,
            discharged: 0.0,
            cost: 0.0,
            cost_without_solar: 0.0,
            savings: 0.0,
            emissions_kg: 0.0,
            avoided_emissions_kg: 0.0,
            cumulative_emissions_kg: 0.0,
            self_sufficiency: f64::NAN,
            degenerate: true,
        }
    }

    fn add_hour(&mut self, row: &LedgerRow, config: &RunConfig) {
        let rates = config.tariff.rates_at(row.hour);
        let factor = config.tariff.emission_kg_per_kwh;

        self.hours += 1;
        self.demand += row.demand;
        self.generation += row.generation;
        self.self_consumed += row.self_consumed;
        self.imported_from_grid += row.imported_from_grid;
        self.exported += row.exported;
        self.curtailed += row.curtailed;
        self.charged += row.stored_delta.max(0.0);
        self.discharged += (-row.stored_delta).max(0.0);
        self.cost +=
            row.imported_from_grid * rates.import_per_kwh - row.exported * rates.export_per_kwh;
        self.cost_without_solar += row.demand * rates.import_per_kwh;
        self.emissions_kg += row.imported_from_grid * factor;
        self.avoided_emissions_kg += row.self_consumed * factor;
    }

    /// Fills the derived fields once every hour has been added.
    fn finish(&mut self, cumulative_before_kg: f64) {
        self.savings = self.cost_without_solar - self.cost;
        self.cumulative_emissions_kg = cumulative_before_kg + self.emissions_kg;
        let supplied = self.self_consumed + self.imported_from_grid;
        if supplied > 0.0 {
            self.self_sufficiency = self.self_consumed / supplied;
            self.degenerate = false;
        } else {
            self.self_sufficiency = f64::NAN;
            self.degenerate = true;
        }
    }

    /// Sums several rows under a new label.
    fn sum<'a>(period: String, rows: impl IntoIterator<Item = &'a PeriodRow>) -> Self {
        let mut total = Self::empty(period);
        for r in rows {
            total.hours += r.hours;
            total.demand += r.demand;
            total.generation += r.generation;
            total.self_consumed += r.self_consumed;
            total.imported_from_grid += r.imported_from_grid;
            total.exported += r.exported;
            total.curtailed += r.curtailed;
            total.charged += r.charged;
            total.discharged += r.discharged;
            total.cost += r.cost;
            total.cost_without_solar += r.cost_without_solar;
            total.emissions_kg += r.emissions_kg;
            total.avoided_emissions_kg += r.avoided_emissions_kg;
        }
        total.finish(0.0);
        total
    }
}

/// Ordered period rows produced by [`run_post_processing`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessResult {
    rows: Vec<PeriodRow>,
}

impl PostProcessResult {
    pub fn rows(&self) -> &[PeriodRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whole-horizon totals as a single row labelled `"total"`.
    pub fn totals(&self) -> PeriodRow {
        PeriodRow::sum("total".to_string(), &self.rows)
    }

    /// Periods whose self-sufficiency is the NaN sentinel.
    pub fn degenerate_periods(&self) -> impl Iterator<Item = &PeriodRow> {
        self.rows.iter().filter(|r| r.degenerate)
    }
}

impl fmt::Display for PostProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.totals();
        writeln!(f, "--- Summary ({} periods) ---", self.rows.len())?;
        writeln!(f, "Demand:              {:.2} kWh", t.demand)?;
        writeln!(f, "Generation:          {:.2} kWh", t.generation)?;
        writeln!(f, "Self-consumed:       {:.2} kWh", t.self_consumed)?;
        writeln!(f, "Imported:            {:.2} kWh", t.imported_from_grid)?;
        writeln!(f, "Exported:            {:.2} kWh", t.exported)?;
        writeln!(f, "Curtailed:           {:.2} kWh", t.curtailed)?;
        writeln!(f, "Cost:                {:.2}", t.cost)?;
        writeln!(f, "Savings:             {:.2}", t.savings)?;
        writeln!(f, "Emissions:           {:.2} kg", t.emissions_kg)?;
        writeln!(f, "Avoided emissions:   {:.2} kg", t.avoided_emissions_kg)?;
        if t.degenerate {
            write!(f, "Self-sufficiency:    n/a")
        } else {
            write!(f, "Self-sufficiency:    {:.1}%", t.self_sufficiency * 100.0)
        }
    }
}

/// Aggregates an energy ledger into reporting periods.
///
/// Hours are grouped by the configured [`ReportPeriod`](super::calendar::ReportPeriod)
/// counted from `config.start_year`. Tariff bands are applied per hour before
/// summing. Progress continues from wherever `control` currently stands, one
/// step per finished period.
///
/// # Errors
///
/// Returns [`SimError::Cancelled`] if the caller cancelled between periods.
/// Degenerate periods are flagged in the result, never returned as errors.
pub fn run_post_processing(
    ledger: &EnergyLedger,
    config: &RunConfig,
    control: &mut RunControl<'_>,
) -> Result<PostProcessResult, SimError> {
    let key_of = |row: &LedgerRow| period_of(row.hour, config.start_year, config.period);

    let mut periods = 0usize;
    let mut last: Option<PeriodKey> = None;
    for row in ledger.rows() {
        let key = key_of(row);
        if last != Some(key) {
            periods += 1;
            last = Some(key);
        }
    }
    control.extend(periods, "Post-processing...");

    let mut rows: Vec<PeriodRow> = Vec::with_capacity(periods);
    let mut cumulative_kg = 0.0;
    let mut current: Option<(PeriodKey, PeriodRow)> = None;

    for row in ledger.rows() {
        let key = key_of(row);
        let same = current.as_ref().is_some_and(|(k, _)| *k == key);
        if !same {
            if let Some((_, done)) = current.take() {
                cumulative_kg = close_period(done, cumulative_kg, &mut rows, control)?;
            }
            current = Some((key, PeriodRow::empty(key.to_string())));
        }
        if let Some((_, acc)) = current.as_mut() {
            acc.add_hour(row, config);
        }
    }
    if let Some((_, done)) = current.take() {
        close_period(done, cumulative_kg, &mut rows, control)?;
    }

    let result = PostProcessResult { rows };
    let totals = result.totals();
    info!(
        periods = result.len(),
        cost = totals.cost,
        savings = totals.savings,
        emissions_kg = totals.emissions_kg,
        "post-processing finished"
    );
    Ok(result)
}

fn close_period(
    mut row: PeriodRow,
    cumulative_kg: f64,
    rows: &mut Vec<PeriodRow>,
    control: &mut RunControl<'_>,
) -> Result<f64, SimError> {
    row.finish(cumulative_kg);
    if row.degenerate {
        warn!(period = %row.period, "no demand in period, self-sufficiency undefined");
    }
    let cumulative = row.cumulative_emissions_kg;
    let label = format!("Post-processing {}...", row.period);
    rows.push(row);
    control.step(&label)?;
    Ok(cumulative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::sim::calendar::ReportPeriod;
    use crate::sim::progress::NoProgress;
    use crate::sim::tariff::{Tariff, TariffBand};
    use crate::sim::types::HourDispatch;

    fn config(import: f64, export: f64, factor: f64) -> RunConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.tariff.import_per_kwh = Some(import);
        cfg.tariff.export_per_kwh = Some(export);
        cfg.tariff.emission_kg_per_kwh = factor;
        RunConfig::try_from(&cfg).expect("valid config")
    }

    fn ledger(hours: usize, f: impl Fn(usize) -> (f64, f64, HourDispatch)) -> EnergyLedger {
        EnergyLedger::from_rows(
            (0..hours)
                .map(|h| {
                    let (d, g, dispatch) = f(h);
                    LedgerRow::new(h, d, g, dispatch)
                })
                .collect(),
        )
    }

    fn post(ledger: &EnergyLedger, config: &RunConfig) -> PostProcessResult {
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        run_post_processing(ledger, config, &mut control).expect("post-processing")
    }

    #[test]
    fn export_only_day_earns_revenue() {
        let l = ledger(24, |_| {
            (
                10.0,
                15.0,
                HourDispatch {
                    self_consumed: 10.0,
                    exported: 5.0,
                    ..HourDispatch::default()
                },
            )
        });
        let result = post(&l, &config(0.20, 0.05, 0.0));
        assert_eq!(result.len(), 1);
        let row = &result.rows()[0];
        assert_eq!(row.period, "2024-01");
        assert!((row.cost + 6.0).abs() < 1e-9);
        assert!((row.cost_without_solar - 48.0).abs() < 1e-9);
        assert!((row.savings - 54.0).abs() < 1e-9);
        assert_eq!(row.self_sufficiency, 1.0);
    }

    #[test]
    fn zero_demand_period_is_flagged_not_fatal() {
        let l = ledger(24, |_| (0.0, 0.0, HourDispatch::default()));
        let result = post(&l, &config(0.2, 0.05, 0.4));
        let row = &result.rows()[0];
        assert!(row.degenerate);
        assert!(row.self_sufficiency.is_nan());
        assert_eq!(result.degenerate_periods().count(), 1);
    }

    #[test]
    fn months_split_at_calendar_boundaries() {
        // 60 days: January (31) + February (28) + 1 day of March
        let l = ledger(60 * 24, |_| {
            (
                1.0,
                0.0,
                HourDispatch {
                    imported_from_grid: 1.0,
                    ..HourDispatch::default()
                },
            )
        });
        let result = post(&l, &config(0.2, 0.05, 0.5));
        let labels: Vec<&str> = result.rows().iter().map(|r| r.period.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(result.rows()[0].hours, 31 * 24);
        assert_eq!(result.rows()[2].hours, 24);
        // cumulative emissions grow monotonically and end at the total
        let last = result.rows().last().map(|r| r.cumulative_emissions_kg);
        assert!(last.is_some_and(|c| (c - 60.0 * 24.0 * 0.5).abs() < 1e-6));
    }

    #[test]
    fn yearly_periods() {
        let mut cfg = config(0.2, 0.05, 0.0);
        cfg.period = ReportPeriod::Year;
        let l = ledger(48, |_| {
            (
                1.0,
                1.0,
                HourDispatch {
                    self_consumed: 1.0,
                    ..HourDispatch::default()
                },
            )
        });
        let result = post(&l, &cfg);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].period, "2024");
    }

    #[test]
    fn bands_apply_per_hour() {
        let mut cfg = config(0.2, 0.05, 0.0);
        cfg.tariff = Tariff {
            bands: vec![TariffBand {
                start_hour: 0,
                end_hour: 12,
                import_per_kwh: 0.1,
                export_per_kwh: 0.0,
            }],
            ..Tariff::flat(0.3, 0.05, 0.0)
        };
        let l = ledger(24, |_| {
            (
                1.0,
                0.0,
                HourDispatch {
                    imported_from_grid: 1.0,
                    ..HourDispatch::default()
                },
            )
        });
        let result = post(&l, &cfg);
        // 12 h at 0.1 + 12 h at 0.3
        assert!((result.rows()[0].cost - 4.8).abs() < 1e-9);
    }

    #[test]
    fn totals_match_ledger_sums() {
        let l = ledger(40 * 24, |h| {
            let g = (h % 24) as f64 * 0.25;
            let d = 2.0;
            let direct = g.min(d);
            (
                d,
                g,
                HourDispatch {
                    self_consumed: direct,
                    exported: g - direct,
                    imported_from_grid: d - direct,
                    ..HourDispatch::default()
                },
            )
        });
        let result = post(&l, &config(0.2, 0.05, 0.3));
        let t = result.totals();
        assert!((t.imported_from_grid - l.total(|r| r.imported_from_grid)).abs() < 1e-6);
        assert!((t.exported - l.total(|r| r.exported)).abs() < 1e-6);
        assert!((t.self_consumed - l.total(|r| r.self_consumed)).abs() < 1e-6);
        assert_eq!(t.hours, l.len());
    }

    #[test]
    fn progress_continues_after_simulation() {
        let mut reports = Vec::new();
        let mut sink = |c: usize, t: usize, _: &str| reports.push((c, t));
        let mut control = RunControl::new(&mut sink);
        control.extend(2, "sim");
        assert!(control.step("day").is_ok());
        assert!(control.step("day").is_ok());
        let l = ledger(24, |_| (0.0, 0.0, HourDispatch::default()));
        let result = run_post_processing(&l, &config(0.2, 0.05, 0.0), &mut control);
        drop(control);
        assert!(result.is_ok());
        assert_eq!(reports.last(), Some(&(3, 3)));
        assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 <= w[1].1));
    }

    #[test]
    fn summary_display_does_not_panic() {
        let l = ledger(24, |_| (0.0, 0.0, HourDispatch::default()));
        let result = post(&l, &config(0.2, 0.05, 0.0));
        let s = format!("{result}");
        assert!(s.contains("n/a"));
    }
}
