//! Core simulation types: dispatch parameters, state, and the energy ledger.

use std::fmt;

use super::calendar::HOURS_PER_DAY;
use crate::config::RunConfig;
use crate::error::SimError;

/// Storage parameters.
///
/// All energies are kWh; with hourly resolution a kW limit is also the
/// kWh that may flow in one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageParams {
    /// Usable capacity. Zero disables storage.
    pub capacity_kwh: f64,
    /// Level at the start of the run.
    pub initial_level_kwh: f64,
    /// Charge limit; `None` is unbounded.
    pub max_charge_kw: Option<f64>,
    /// Discharge limit; `None` is unbounded.
    pub max_discharge_kw: Option<f64>,
    /// Fraction of charged energy that ends up stored.
    pub eta_charge: f64,
    /// Fraction of withdrawn stored energy delivered to the site.
    pub eta_discharge: f64,
}

impl StorageParams {
    /// No storage at all.
    pub fn none() -> Self {
        Self::lossless(0.0, 0.0)
    }

    /// Lossless storage without power limits.
    pub fn lossless(capacity_kwh: f64, initial_level_kwh: f64) -> Self {
        Self {
            capacity_kwh,
            initial_level_kwh,
            max_charge_kw: None,
            max_discharge_kw: None,
            eta_charge: 1.0,
            eta_discharge: 1.0,
        }
    }
}

/// Everything a dispatch strategy needs besides the day's values.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchParams {
    pub storage: StorageParams,
    /// Export ceiling per hour; `None` is unbounded.
    pub max_export_kw: Option<f64>,
}

impl DispatchParams {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            storage: config.storage.clone(),
            max_export_kw: config.max_export_kw,
        }
    }
}

/// State carried from one day to the next.
///
/// Owned by the simulation manager and threaded by value through every
/// strategy call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchState {
    /// Energy held in storage (kWh), within `[0, capacity]`.
    pub storage_level_kwh: f64,
}

impl DispatchState {
    pub fn initial(params: &DispatchParams) -> Self {
        Self {
            storage_level_kwh: params.storage.initial_level_kwh,
        }
    }
}

/// One day of aligned demand and generation values.
#[derive(Debug, Clone, Copy)]
pub struct DaySlice<'a> {
    /// Zero-based day index within the horizon.
    pub day: usize,
    pub demand: &'a [f64],
    pub generation: &'a [f64],
}

impl<'a> DaySlice<'a> {
    /// Builds a day slice, checking that both sides hold exactly 24 values.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Shape`] when either slice is not 24 hours long.
    pub fn new(day: usize, demand: &'a [f64], generation: &'a [f64]) -> Result<Self, SimError> {
        if demand.len() != HOURS_PER_DAY || generation.len() != HOURS_PER_DAY {
            return Err(SimError::shape(format!(
                "day {day} has {} demand and {} generation values, expected {HOURS_PER_DAY}",
                demand.len(),
                generation.len()
            )));
        }
        Ok(Self {
            day,
            demand,
            generation,
        })
    }

    /// Hour index of the first value, counted from the horizon start.
    pub fn first_hour(&self) -> usize {
        self.day * HOURS_PER_DAY
    }
}

/// Strategy decision for one hour.
///
/// `self_consumed` counts every kWh supplied on site, directly from
/// generation or from storage discharge. `stored_delta` is the flow across
/// the storage boundary: positive while charging, negative while discharging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HourDispatch {
    pub self_consumed: f64,
    pub exported: f64,
    pub imported_from_grid: f64,
    pub curtailed: f64,
    pub stored_delta: f64,
}

impl HourDispatch {
    /// Energy flowing into storage.
    pub fn charged(&self) -> f64 {
        self.stored_delta.max(0.0)
    }

    /// Energy flowing out of storage.
    pub fn discharged(&self) -> f64 {
        (-self.stored_delta).max(0.0)
    }
}

/// One hour of the energy ledger.
///
/// Field names are the column contract of the ledger table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerRow {
    pub hour: usize,
    pub demand: f64,
    pub generation: f64,
    pub self_consumed: f64,
    pub exported: f64,
    pub imported_from_grid: f64,
    pub curtailed: f64,
    pub stored_delta: f64,
}

impl LedgerRow {
    pub fn new(hour: usize, demand: f64, generation: f64, dispatch: HourDispatch) -> Self {
        Self {
            hour,
            demand,
            generation,
            self_consumed: dispatch.self_consumed,
            exported: dispatch.exported,
            imported_from_grid: dispatch.imported_from_grid,
            curtailed: dispatch.curtailed,
            stored_delta: dispatch.stored_delta,
        }
    }
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>6} | demand={:>7.3}  gen={:>7.3} | self={:>7.3}  \
             imp={:>7.3}  exp={:>7.3}  curt={:>7.3}  stored={:>+7.3}",
            self.hour,
            self.demand,
            self.generation,
            self.self_consumed,
            self.imported_from_grid,
            self.exported,
            self.curtailed,
            self.stored_delta,
        )
    }
}

/// Hourly energy ledger produced by one simulation run.
///
/// Immutable once built; rows are in hour order without gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyLedger {
    rows: Vec<LedgerRow>,
}

impl EnergyLedger {
    pub(crate) fn from_rows(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of one column over all hours.
    pub fn total(&self, field: impl Fn(&LedgerRow) -> f64) -> f64 {
        self.rows.iter().map(field).sum()
    }
}
