use std::path::PathBuf;

use rand::{SeedableRng, rngs::StdRng};

use super::csv::read_hourly_csv;
use super::types::{HourlySource, gaussian_noise, repeat_profile, require_one_year};
use crate::error::SourceError;
use crate::sim::calendar::{HOURS_PER_DAY, HOURS_PER_YEAR};

/// Multiplier applied to every hour of the given year offset.
fn growth(growth_factor: f64, hour: usize) -> f64 {
    growth_factor.powi((hour / HOURS_PER_YEAR) as i32)
}

/// A synthetic demand profile modelling daily consumption patterns.
///
/// Combines a baseline, a sinusoidal daily swing with configurable phase,
/// Gaussian noise, and a yearly growth factor.
///
/// # Examples
///
/// ```
/// use hot_sun::sources::{HourlySource, SyntheticDemand};
///
/// let mut demand = SyntheticDemand::new(1.0, 0.5, 0.0, 0.0, 1.0, 42);
/// let day = demand.hourly_series(24).unwrap();
/// assert_eq!(day.len(), 24);
/// assert!(day.iter().all(|kwh| *kwh >= 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticDemand {
    /// Baseline consumption (kWh per hour).
    pub base_kw: f64,

    /// Amplitude of the daily swing (kWh per hour).
    pub amp_kw: f64,

    /// Phase offset of the daily swing (radians).
    pub phase_rad: f64,

    /// Standard deviation of the Gaussian noise (kWh per hour).
    pub noise_std: f64,

    /// Yearly demand multiplier.
    pub growth_factor: f64,

    rng: StdRng,
}

impl SyntheticDemand {
    /// Creates a new synthetic demand profile.
    ///
    /// # Arguments
    ///
    /// * `base_kw` - Average consumption
    /// * `amp_kw` - Daily variation
    /// * `phase_rad` - Phase shift of the daily sinusoid
    /// * `noise_std` - Noise standard deviation
    /// * `growth_factor` - Yearly multiplier (1.0 for flat demand)
    /// * `seed` - Random seed for reproducible noise
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        growth_factor: f64,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std: noise_std.max(0.0),
            growth_factor,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Demand in a single hour; never negative.
    pub fn demand_kwh(&mut self, hour: usize) -> f64 {
        let day_pos = (hour % HOURS_PER_DAY) as f64 / HOURS_PER_DAY as f64;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        let kwh = self.base_kw + self.amp_kw * angle.sin() + noise;
        kwh.max(0.0) * growth(self.growth_factor, hour)
    }
}

impl HourlySource for SyntheticDemand {
    fn hourly_series(&mut self, hours: usize) -> Result<Vec<f64>, SourceError> {
        Ok((0..hours).map(|h| self.demand_kwh(h)).collect())
    }

    fn source_type(&self) -> &'static str {
        "SyntheticDemand"
    }
}

/// Demand from a one-year hourly profile, repeated with yearly growth.
///
/// The profile must hold exactly [`HOURS_PER_YEAR`] values.
#[derive(Debug, Clone)]
pub struct YearlyProfileDemand {
    path: PathBuf,
    growth_factor: f64,
    profile: Option<Vec<f64>>,
}

impl YearlyProfileDemand {
    /// Demand loaded lazily from `path` on first use.
    pub fn from_path(path: impl Into<PathBuf>, growth_factor: f64) -> Self {
        Self {
            path: path.into(),
            growth_factor,
            profile: None,
        }
    }

    /// Demand from an in-memory profile.
    pub fn from_profile(profile: Vec<f64>, growth_factor: f64) -> Self {
        Self {
            path: PathBuf::new(),
            growth_factor,
            profile: Some(profile),
        }
    }
}

impl HourlySource for YearlyProfileDemand {
    fn hourly_series(&mut self, hours: usize) -> Result<Vec<f64>, SourceError> {
        if self.profile.is_none() {
            self.profile = Some(read_hourly_csv(&self.path)?);
        }
        let profile = self.profile.as_deref().unwrap_or_default();
        require_one_year(profile, &self.path.display().to_string())?;
        let mut series = repeat_profile(profile, hours);
        for (hour, kwh) in series.iter_mut().enumerate() {
            *kwh *= growth(self.growth_factor, hour);
        }
        Ok(series)
    }

    fn source_type(&self) -> &'static str {
        "YearlyProfileDemand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_demand_is_deterministic() {
        let mut a = SyntheticDemand::new(0.8, 0.7, 1.2, 0.05, 1.0, 42);
        let mut b = SyntheticDemand::new(0.8, 0.7, 1.2, 0.05, 1.0, 42);
        assert_eq!(a.hourly_series(48).ok(), b.hourly_series(48).ok());
    }

    #[test]
    fn synthetic_demand_never_negative() {
        let mut d = SyntheticDemand::new(0.1, 1.0, 0.0, 0.5, 1.0, 3);
        let series = d.hourly_series(240).unwrap_or_default();
        assert!(series.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn noiseless_demand_follows_sinusoid() {
        let mut d = SyntheticDemand::new(1.0, 0.5, 0.0, 0.0, 1.0, 0);
        // quarter day: sin(pi/2) = 1
        assert!((d.demand_kwh(6) - 1.5).abs() < 1e-12);
        assert!((d.demand_kwh(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn growth_applies_from_second_year() {
        let mut d = SyntheticDemand::new(1.0, 0.0, 0.0, 0.0, 1.1, 0);
        assert_eq!(d.demand_kwh(HOURS_PER_YEAR - 1), 1.0);
        assert!((d.demand_kwh(HOURS_PER_YEAR) - 1.1).abs() < 1e-12);
        assert!((d.demand_kwh(2 * HOURS_PER_YEAR) - 1.21).abs() < 1e-12);
    }

    #[test]
    fn yearly_profile_repeats_with_growth() {
        let profile: Vec<f64> = (0..HOURS_PER_YEAR).map(|h| (h % 24) as f64).collect();
        let mut d = YearlyProfileDemand::from_profile(profile, 2.0);
        let series = d.hourly_series(2 * HOURS_PER_YEAR).unwrap_or_default();
        assert_eq!(series.len(), 2 * HOURS_PER_YEAR);
        assert_eq!(series[5], 5.0);
        assert_eq!(series[HOURS_PER_YEAR + 5], 10.0);
    }

    #[test]
    fn two_day_profile_is_rejected() {
        let mut d = YearlyProfileDemand::from_profile(vec![1.0; 48], 1.0);
        let err = d.hourly_series(HOURS_PER_YEAR);
        assert!(matches!(
            err,
            Err(SourceError::Length {
                found: 48,
                expected: HOURS_PER_YEAR,
                ..
            })
        ));
    }

    #[test]
    fn leap_year_profile_is_rejected() {
        let mut d = YearlyProfileDemand::from_profile(vec![1.0; HOURS_PER_YEAR + 24], 1.0);
        assert!(matches!(
            d.hourly_series(HOURS_PER_YEAR),
            Err(SourceError::Length { found: 8784, .. })
        ));
    }

    #[test]
    fn missing_profile_file_is_reported() {
        let mut d = YearlyProfileDemand::from_path("/no/such/profile.csv", 1.0);
        assert!(d.hourly_series(24).is_err());
    }
}
