//! Hourly demand and generation series feeding the simulation.

/// CSV profile reader.
pub mod csv;
/// Household demand models.
pub mod demand;
/// PV generation models.
pub mod solar;
pub mod types;

pub use demand::{SyntheticDemand, YearlyProfileDemand};
pub use solar::{CsvSolar, SyntheticSolar};
pub use types::{HourlySource, gaussian_noise};

use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::SourceError;

/// Builds the demand source described by `cfg.demand`.
///
/// # Errors
///
/// Returns [`SourceError::Unconfigured`] when a CSV source has no path.
pub fn demand_source(cfg: &ScenarioConfig) -> Result<Box<dyn HourlySource>, SourceError> {
    let d = &cfg.demand;
    match d.source.as_str() {
        "csv" => {
            let path = d
                .path
                .as_deref()
                .ok_or(SourceError::Unconfigured { key: "demand.path" })?;
            Ok(Box::new(YearlyProfileDemand::from_path(
                path,
                d.growth_factor,
            )))
        }
        _ => Ok(Box::new(SyntheticDemand::new(
            d.base_kw,
            d.amp_kw,
            d.phase_rad,
            d.noise_std,
            d.growth_factor,
            cfg.simulation.seed,
        ))),
    }
}

/// Builds the generation source described by `cfg.solar`.
///
/// # Errors
///
/// Returns [`SourceError::Unconfigured`] when no datasource is set or a CSV
/// source has no path.
pub fn generation_source(cfg: &ScenarioConfig) -> Result<Box<dyn HourlySource>, SourceError> {
    let s = &cfg.solar;
    match s.datasource.as_deref() {
        Some("csv") => {
            let path = s
                .path
                .as_deref()
                .ok_or(SourceError::Unconfigured { key: "solar.path" })?;
            Ok(Box::new(CsvSolar::from_path(path, s.peakpower, s.loss)))
        }
        Some(_) => Ok(Box::new(SyntheticSolar::new(
            s.peakpower,
            s.loss,
            s.sunrise_hour,
            s.sunset_hour,
            s.noise_std,
            s.seasonal_amplitude,
            cfg.simulation.seed.wrapping_add(1),
        ))),
        None => Err(SourceError::Unconfigured {
            key: "solar.datasource",
        }),
    }
}

/// Produces the demand series for `hours` hours.
///
/// # Errors
///
/// Propagates any [`SourceError`] from building or reading the source.
pub fn demand_series(cfg: &ScenarioConfig, hours: usize) -> Result<Vec<f64>, SourceError> {
    let mut source = demand_source(cfg)?;
    let series = source.hourly_series(hours)?;
    info!(source = source.source_type(), hours, "demand series ready");
    Ok(series)
}

/// Produces the generation series for `hours` hours.
///
/// # Errors
///
/// Propagates any [`SourceError`] from building or reading the source.
pub fn generation_series(cfg: &ScenarioConfig, hours: usize) -> Result<Vec<f64>, SourceError> {
    let mut source = generation_source(cfg)?;
    let series = source.hourly_series(hours)?;
    info!(source = source.source_type(), hours, "generation series ready");
    Ok(series)
}
