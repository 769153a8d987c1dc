//! Shared test fixtures for integration tests.

use hot_sun::config::{RunConfig, ScenarioConfig};
use hot_sun::error::SimError;
use hot_sun::sim::{
    DispatchStrategy, EnergyLedger, GreedyDailyStrategy, NoProgress, PostProcessResult,
    RunControl, run_post_processing, run_simulation,
};

/// Per-hour tolerance for energy balance checks.
pub const TOL: f64 = 1e-9;

/// Flat-tariff configuration (0.20 import, 0.05 export, 0.4 kg/kWh) over
/// `hours` hours starting 2024, with a lossless store of `capacity_kwh`.
pub fn run_config(hours: usize, capacity_kwh: f64) -> RunConfig {
    let mut scenario = ScenarioConfig::baseline();
    scenario.simulation.horizon_hours = Some(hours);
    scenario.storage.capacity_kwh = capacity_kwh;
    RunConfig::try_from(&scenario).expect("baseline scenario is valid")
}

/// Home-battery configuration (10 kWh, 5 kW, 95% efficiency) over `hours`.
pub fn battery_config(hours: usize) -> RunConfig {
    let mut scenario = ScenarioConfig::home_battery();
    scenario.simulation.horizon_hours = Some(hours);
    RunConfig::try_from(&scenario).expect("home_battery scenario is valid")
}

/// Daytime bell of `peak` kWh between 06:00 and 18:00, zero at night.
pub fn solar_days(days: usize, peak: f64) -> Vec<f64> {
    (0..days * 24)
        .map(|h| {
            let hod = h % 24;
            if (6..18).contains(&hod) {
                peak * (std::f64::consts::PI * (hod - 6) as f64 / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect()
}

/// Evening-heavy household demand.
pub fn household_days(days: usize) -> Vec<f64> {
    (0..days * 24)
        .map(|h| if (17..22).contains(&(h % 24)) { 2.5 } else { 0.6 })
        .collect()
}

/// Runs `strategy` without progress reporting.
pub fn simulate_with<S: DispatchStrategy + ?Sized>(
    demand: &[f64],
    generation: &[f64],
    strategy: &S,
    config: &RunConfig,
) -> Result<EnergyLedger, SimError> {
    let mut sink = NoProgress;
    let mut control = RunControl::new(&mut sink);
    run_simulation(demand, generation, strategy, config, &mut control)
}

/// Runs the greedy-daily strategy without progress reporting.
pub fn simulate(
    demand: &[f64],
    generation: &[f64],
    config: &RunConfig,
) -> Result<EnergyLedger, SimError> {
    simulate_with(demand, generation, &GreedyDailyStrategy, config)
}

/// Post-processes a ledger without progress reporting.
pub fn post_process(ledger: &EnergyLedger, config: &RunConfig) -> PostProcessResult {
    let mut sink = NoProgress;
    let mut control = RunControl::new(&mut sink);
    run_post_processing(ledger, config, &mut control).expect("post-processing succeeds")
}
