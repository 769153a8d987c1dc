//! Simulation manager: drives a dispatch strategy over the whole horizon.

use tracing::{debug, info};

use super::balance::imbalance;
use super::calendar::HOURS_PER_DAY;
use super::progress::RunControl;
use super::strategy::DispatchStrategy;
use super::types::{DaySlice, DispatchParams, DispatchState, EnergyLedger, LedgerRow};
use crate::config::RunConfig;
use crate::error::SimError;

/// Days between progress reports.
pub const PROGRESS_EVERY_DAYS: usize = 1;

/// Checks both series before any dispatch happens.
fn check_inputs(demand: &[f64], generation: &[f64], config: &RunConfig) -> Result<usize, SimError> {
    if demand.len() != generation.len() {
        return Err(SimError::shape(format!(
            "demand has {} hourly values but generation has {}",
            demand.len(),
            generation.len()
        )));
    }
    let horizon = demand.len();
    if horizon != config.horizon_hours {
        return Err(SimError::shape(format!(
            "series hold {horizon} hours but the configured horizon is {} hours",
            config.horizon_hours
        )));
    }
    if horizon == 0 || horizon % HOURS_PER_DAY != 0 {
        return Err(SimError::shape(format!(
            "horizon of {horizon} hours is not a positive multiple of {HOURS_PER_DAY}"
        )));
    }
    for (series, values) in [("demand", demand), ("generation", generation)] {
        if let Some((hour, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(SimError::InvalidSample {
                series,
                hour,
                value,
            });
        }
    }
    Ok(horizon / HOURS_PER_DAY)
}

/// Runs the hourly dispatch simulation.
///
/// Slices both series into days, calls `strategy` once per day threading the
/// [`DispatchState`] through, verifies the energy balance of every hour and
/// concatenates the results into an [`EnergyLedger`]. Progress is reported
/// after every day; cancellation is checked at the same boundaries.
///
/// # Errors
///
/// - [`SimError::Shape`] for mismatched lengths or a horizon that is not a
///   multiple of 24 hours, raised before the first dispatch call.
/// - [`SimError::InvalidSample`] for negative or non-finite inputs.
/// - [`SimError::ConservationViolation`] with the first offending hour.
/// - [`SimError::StorageOutOfBounds`] when a strategy returns a level outside
///   `[0, capacity]`.
/// - [`SimError::Cancelled`] when the caller cancelled between days.
pub fn run_simulation<S>(
    demand: &[f64],
    generation: &[f64],
    strategy: &S,
    config: &RunConfig,
    control: &mut RunControl<'_>,
) -> Result<EnergyLedger, SimError>
where
    S: DispatchStrategy + ?Sized,
{
    let days = check_inputs(demand, generation, config)?;
    control.check_cancelled()?;

    let params = DispatchParams::from_config(config);
    let capacity = params.storage.capacity_kwh;
    let mut state = DispatchState::initial(&params);
    let mut rows = Vec::with_capacity(demand.len());

    info!(
        strategy = strategy.name(),
        days,
        capacity_kwh = capacity,
        "starting simulation"
    );
    control.extend(days, "Simulating...");

    for (day, (d, g)) in demand
        .chunks_exact(HOURS_PER_DAY)
        .zip(generation.chunks_exact(HOURS_PER_DAY))
        .enumerate()
    {
        let slice = DaySlice::new(day, d, g)?;
        let (hours, next) = strategy.dispatch(&slice, state, &params);
        if hours.len() != HOURS_PER_DAY {
            return Err(SimError::shape(format!(
                "strategy {} returned {} hours for day {day}",
                strategy.name(),
                hours.len()
            )));
        }

        for (offset, dispatch) in hours.into_iter().enumerate() {
            let hour = slice.first_hour() + offset;
            if let Some(detail) = imbalance(d[offset], g[offset], &dispatch) {
                return Err(SimError::ConservationViolation { hour, detail });
            }
            rows.push(LedgerRow::new(hour, d[offset], g[offset], dispatch));
        }

        let level = next.storage_level_kwh;
        if !(0.0..=capacity).contains(&level) {
            return Err(SimError::StorageOutOfBounds {
                day,
                level_kwh: level,
                capacity_kwh: capacity,
            });
        }
        state = next;
        debug!(day, storage_level_kwh = level, "day dispatched");

        if (day + 1) % PROGRESS_EVERY_DAYS == 0 || day + 1 == days {
            control.step(&format!("Simulating day {} of {days}...", day + 1))?;
        }
    }

    let ledger = EnergyLedger::from_rows(rows);
    info!(
        hours = ledger.len(),
        imported = ledger.total(|r| r.imported_from_grid),
        exported = ledger.total(|r| r.exported),
        "simulation finished"
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::sim::progress::NoProgress;
    use crate::sim::strategy::GreedyDailyStrategy;
    use crate::sim::types::HourDispatch;

    fn config(hours: usize, capacity: f64) -> RunConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.horizon_hours = Some(hours);
        cfg.storage.capacity_kwh = capacity;
        RunConfig::try_from(&cfg).expect("valid config")
    }

    /// Strategy that forgets to account for surplus generation.
    struct Leaky;

    impl DispatchStrategy for Leaky {
        fn name(&self) -> &'static str {
            "leaky"
        }

        fn dispatch(
            &self,
            day: &DaySlice<'_>,
            state: DispatchState,
            _params: &DispatchParams,
        ) -> (Vec<HourDispatch>, DispatchState) {
            let hours = day
                .demand
                .iter()
                .zip(day.generation)
                .map(|(&d, &g)| HourDispatch {
                    self_consumed: d.min(g),
                    imported_from_grid: (d - g).max(0.0),
                    ..HourDispatch::default()
                })
                .collect();
            (hours, state)
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        let result = run_simulation(
            &[1.0; 48],
            &[1.0; 24],
            &GreedyDailyStrategy,
            &config(48, 0.0),
            &mut control,
        );
        assert!(matches!(result, Err(SimError::Shape(_))));
    }

    #[test]
    fn partial_day_is_rejected() {
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        let result = run_simulation(
            &[1.0; 25],
            &[1.0; 25],
            &GreedyDailyStrategy,
            &config(25, 0.0),
            &mut control,
        );
        assert!(matches!(result, Err(SimError::Shape(_))));
    }

    #[test]
    fn negative_sample_is_rejected() {
        let mut demand = [1.0; 24];
        demand[7] = -0.5;
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        let result = run_simulation(
            &demand,
            &[0.0; 24],
            &GreedyDailyStrategy,
            &config(24, 0.0),
            &mut control,
        );
        assert!(matches!(
            result,
            Err(SimError::InvalidSample {
                series: "demand",
                hour: 7,
                ..
            })
        ));
    }

    #[test]
    fn broken_strategy_is_caught_with_hour() {
        let mut generation = [0.0; 48];
        generation[30] = 2.0;
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        let result = run_simulation(
            &[1.0; 48],
            &generation,
            &Leaky,
            &config(48, 0.0),
            &mut control,
        );
        assert!(matches!(
            result,
            Err(SimError::ConservationViolation { hour: 30, .. })
        ));
    }

    #[test]
    fn ledger_rows_are_in_hour_order() {
        let mut sink = NoProgress;
        let mut control = RunControl::new(&mut sink);
        let ledger = run_simulation(
            &[1.0; 72],
            &[2.0; 72],
            &GreedyDailyStrategy,
            &config(72, 5.0),
            &mut control,
        )
        .expect("simulation should succeed");
        assert_eq!(ledger.len(), 72);
        assert!(ledger.rows().iter().enumerate().all(|(i, r)| r.hour == i));
    }

    #[test]
    fn progress_reports_every_day() {
        let mut reports = Vec::new();
        let mut sink = |c: usize, t: usize, _: &str| reports.push((c, t));
        let mut control = RunControl::new(&mut sink);
        let result = run_simulation(
            &[1.0; 96],
            &[0.5; 96],
            &GreedyDailyStrategy,
            &config(96, 0.0),
            &mut control,
        );
        drop(control);
        assert!(result.is_ok());
        assert_eq!(reports, vec![(0, 4), (1, 4), (2, 4), (3, 4), (4, 4)]);
    }
}
