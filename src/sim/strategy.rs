//! Dispatch strategies deciding where each hour's energy goes.

use std::str::FromStr;

use super::types::{DaySlice, DispatchParams, DispatchState, HourDispatch};

/// Capability shared by every dispatch policy.
///
/// A strategy sees one day at a time plus the state carried over from the
/// previous day, and returns one [`HourDispatch`] per hour together with the
/// state to hand to the next day. Implementations must not keep state of
/// their own between calls.
pub trait DispatchStrategy {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Dispatches one day.
    fn dispatch(
        &self,
        day: &DaySlice<'_>,
        state: DispatchState,
        params: &DispatchParams,
    ) -> (Vec<HourDispatch>, DispatchState);
}

/// Strategy selector as named in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    GreedyDaily,
    GridOnly,
}

impl StrategyKind {
    /// Instantiates the selected strategy.
    pub fn build(self) -> Box<dyn DispatchStrategy> {
        match self {
            Self::GreedyDaily => Box::new(GreedyDailyStrategy),
            Self::GridOnly => Box::new(GridOnlyStrategy),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy_daily" => Ok(Self::GreedyDaily),
            "grid_only" => Ok(Self::GridOnly),
            other => Err(format!("unknown strategy \"{other}\"")),
        }
    }
}

fn limit(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::INFINITY)
}

/// Sends surplus to export up to the ceiling and curtails the rest.
fn export_or_curtail(surplus: f64, params: &DispatchParams) -> (f64, f64) {
    let exported = surplus.min(limit(params.max_export_kw));
    (exported, surplus - exported)
}

/// Greedy hour-by-hour policy without look-ahead.
///
/// Generation serves demand first. Surplus charges storage up to the headroom
/// and charge limit, then goes to export, then is curtailed. Shortfall is
/// covered from storage up to the stored energy and discharge limit, then
/// imported.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyDailyStrategy;

impl GreedyDailyStrategy {
    /// Dispatches a single hour and returns the storage level after it.
    pub fn dispatch_hour(
        &self,
        demand: f64,
        generation: f64,
        level_kwh: f64,
        params: &DispatchParams,
    ) -> (HourDispatch, f64) {
        let storage = &params.storage;
        let capacity = storage.capacity_kwh.max(0.0);
        let direct = generation.min(demand);
        let mut out = HourDispatch {
            self_consumed: direct,
            ..HourDispatch::default()
        };
        let mut level = level_kwh;

        if generation >= demand {
            let surplus = generation - direct;
            let headroom = if capacity > 0.0 {
                ((capacity - level) / storage.eta_charge).max(0.0)
            } else {
                0.0
            };
            let mut charge = surplus.min(headroom).min(limit(storage.max_charge_kw));
            if charge > 0.0 {
                level += charge * storage.eta_charge;
                if level > capacity {
                    // Float drift past the top: give the excess back to export/curtail.
                    let excess = (level - capacity) / storage.eta_charge;
                    charge = (charge - excess).max(0.0);
                    level = capacity;
                }
            }
            let (exported, curtailed) = export_or_curtail(surplus - charge, params);
            out.exported = exported;
            out.curtailed = curtailed;
            out.stored_delta = charge;
        } else {
            let deficit = demand - direct;
            let available = if capacity > 0.0 {
                level.max(0.0) * storage.eta_discharge
            } else {
                0.0
            };
            let mut discharge = deficit.min(available).min(limit(storage.max_discharge_kw));
            if discharge > 0.0 {
                level -= discharge / storage.eta_discharge;
                if level < 0.0 {
                    // Float drift below empty: the missing energy comes from the grid.
                    let shortfall = -level * storage.eta_discharge;
                    discharge = (discharge - shortfall).max(0.0);
                    level = 0.0;
                }
                out.stored_delta = -discharge;
            }
            out.self_consumed = direct + discharge;
            out.imported_from_grid = deficit - discharge;
        }

        (out, level.clamp(0.0, capacity))
    }
}

impl DispatchStrategy for GreedyDailyStrategy {
    fn name(&self) -> &'static str {
        "greedy_daily"
    }

    fn dispatch(
        &self,
        day: &DaySlice<'_>,
        state: DispatchState,
        params: &DispatchParams,
    ) -> (Vec<HourDispatch>, DispatchState) {
        let mut level = state.storage_level_kwh;
        let hours = day
            .demand
            .iter()
            .zip(day.generation)
            .map(|(&demand, &generation)| {
                let (out, next) = self.dispatch_hour(demand, generation, level, params);
                level = next;
                out
            })
            .collect();
        (
            hours,
            DispatchState {
                storage_level_kwh: level,
            },
        )
    }
}

/// Reference policy that never touches storage.
///
/// Surplus is exported (then curtailed above the export ceiling) and
/// shortfall is imported. Useful as a baseline against storage strategies.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridOnlyStrategy;

impl DispatchStrategy for GridOnlyStrategy {
    fn name(&self) -> &'static str {
        "grid_only"
    }

    fn dispatch(
        &self,
        day: &DaySlice<'_>,
        state: DispatchState,
        params: &DispatchParams,
    ) -> (Vec<HourDispatch>, DispatchState) {
        let hours = day
            .demand
            .iter()
            .zip(day.generation)
            .map(|(&demand, &generation)| {
                let direct = generation.min(demand);
                let (exported, curtailed) = export_or_curtail(generation - direct, params);
                HourDispatch {
                    self_consumed: direct,
                    exported,
                    imported_from_grid: demand - direct,
                    curtailed,
                    stored_delta: 0.0,
                }
            })
            .collect();
        (hours, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::balance::imbalance;
    use crate::sim::types::StorageParams;

    fn params(storage: StorageParams) -> DispatchParams {
        DispatchParams {
            storage,
            max_export_kw: None,
        }
    }

    #[test]
    fn surplus_without_storage_is_exported() {
        let p = params(StorageParams::none());
        let (out, level) = GreedyDailyStrategy.dispatch_hour(10.0, 15.0, 0.0, &p);
        assert_eq!(out.self_consumed, 10.0);
        assert_eq!(out.exported, 5.0);
        assert_eq!(out.imported_from_grid, 0.0);
        assert_eq!(out.stored_delta, 0.0);
        assert_eq!(level, 0.0);
    }

    #[test]
    fn shortfall_without_storage_is_imported() {
        let p = params(StorageParams::none());
        let (out, _) = GreedyDailyStrategy.dispatch_hour(10.0, 4.0, 0.0, &p);
        assert_eq!(out.self_consumed, 4.0);
        assert_eq!(out.imported_from_grid, 6.0);
        assert_eq!(out.stored_delta, 0.0);
    }

    #[test]
    fn surplus_charges_before_export() {
        let p = params(StorageParams::lossless(3.0, 1.0));
        let (out, level) = GreedyDailyStrategy.dispatch_hour(2.0, 6.0, 1.0, &p);
        // 4 surplus: 2 fills storage, 2 exported
        assert_eq!(out.stored_delta, 2.0);
        assert_eq!(out.exported, 2.0);
        assert_eq!(level, 3.0);
        assert_eq!(imbalance(2.0, 6.0, &out), None);
    }

    #[test]
    fn charge_rate_limit_applies() {
        let mut storage = StorageParams::lossless(10.0, 0.0);
        storage.max_charge_kw = Some(1.5);
        let (out, level) = GreedyDailyStrategy.dispatch_hour(0.0, 4.0, 0.0, &params(storage));
        assert_eq!(out.stored_delta, 1.5);
        assert_eq!(out.exported, 2.5);
        assert_eq!(level, 1.5);
    }

    #[test]
    fn shortfall_discharges_before_import() {
        let mut storage = StorageParams::lossless(10.0, 5.0);
        storage.max_discharge_kw = Some(3.0);
        let (out, level) = GreedyDailyStrategy.dispatch_hour(6.0, 1.0, 5.0, &params(storage));
        // 5 deficit: 3 from storage (rate limit), 2 imported
        assert_eq!(out.stored_delta, -3.0);
        assert_eq!(out.self_consumed, 4.0);
        assert_eq!(out.imported_from_grid, 2.0);
        assert_eq!(level, 2.0);
        assert_eq!(imbalance(6.0, 1.0, &out), None);
    }

    #[test]
    fn discharge_bounded_by_stored_energy() {
        let p = params(StorageParams::lossless(10.0, 1.0));
        let (out, level) = GreedyDailyStrategy.dispatch_hour(5.0, 0.0, 1.0, &p);
        assert_eq!(out.stored_delta, -1.0);
        assert_eq!(out.imported_from_grid, 4.0);
        assert_eq!(level, 0.0);
    }

    #[test]
    fn export_ceiling_curtails_the_rest() {
        let p = DispatchParams {
            storage: StorageParams::lossless(1.0, 0.0),
            max_export_kw: Some(2.0),
        };
        let (out, _) = GreedyDailyStrategy.dispatch_hour(1.0, 8.0, 0.0, &p);
        assert_eq!(out.stored_delta, 1.0);
        assert_eq!(out.exported, 2.0);
        assert_eq!(out.curtailed, 4.0);
        assert_eq!(imbalance(1.0, 8.0, &out), None);
    }

    #[test]
    fn efficiency_losses_stay_inside_storage() {
        let mut storage = StorageParams::lossless(10.0, 0.0);
        storage.eta_charge = 0.8;
        storage.eta_discharge = 0.5;
        let p = params(storage);

        let (charge, level) = GreedyDailyStrategy.dispatch_hour(0.0, 5.0, 0.0, &p);
        assert_eq!(charge.stored_delta, 5.0);
        assert!((level - 4.0).abs() < 1e-12);

        let (discharge, level) = GreedyDailyStrategy.dispatch_hour(3.0, 0.0, level, &p);
        // 4 kWh stored delivers at most 2 kWh
        assert!((discharge.stored_delta + 2.0).abs() < 1e-12);
        assert!((discharge.imported_from_grid - 1.0).abs() < 1e-12);
        assert!(level.abs() < 1e-12);
        assert_eq!(imbalance(3.0, 0.0, &discharge), None);
    }

    #[test]
    fn day_dispatch_threads_state() {
        let p = params(StorageParams::lossless(5.0, 0.0));
        let demand = [1.0; 24];
        let mut generation = [0.0; 24];
        generation[..12].fill(2.0);
        let day = DaySlice::new(0, &demand, &generation).expect("24 hours");
        let (hours, state) =
            GreedyDailyStrategy.dispatch(&day, DispatchState { storage_level_kwh: 0.0 }, &p);
        assert_eq!(hours.len(), 24);
        // 5 hours of 1 kWh surplus fill storage, 5 evening hours drain it
        assert_eq!(hours[0].stored_delta, 1.0);
        assert_eq!(hours[5].exported, 1.0);
        assert_eq!(hours[12].stored_delta, -1.0);
        assert_eq!(hours[17].imported_from_grid, 1.0);
        assert_eq!(state.storage_level_kwh, 0.0);
    }

    #[test]
    fn grid_only_ignores_storage() {
        let p = params(StorageParams::lossless(10.0, 5.0));
        let demand = [2.0; 24];
        let generation = [3.0; 24];
        let day = DaySlice::new(0, &demand, &generation).expect("24 hours");
        let state = DispatchState { storage_level_kwh: 5.0 };
        let (hours, next) = GridOnlyStrategy.dispatch(&day, state, &p);
        assert!(hours.iter().all(|h| h.stored_delta == 0.0 && h.exported == 1.0));
        assert_eq!(next, state);
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(
            "greedy_daily".parse::<StrategyKind>(),
            Ok(StrategyKind::GreedyDaily)
        );
        assert_eq!("grid_only".parse::<StrategyKind>(), Ok(StrategyKind::GridOnly));
        assert!("lookahead".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::GridOnly.build().name(), "grid_only");
    }
}
