use std::path::PathBuf;

use rand::{SeedableRng, rngs::StdRng};

use super::csv::read_hourly_csv;
use super::types::{HourlySource, gaussian_noise, repeat_profile, require_one_year};
use crate::error::SourceError;
use crate::sim::calendar::{DAYS_PER_YEAR, HOURS_PER_DAY, HOURS_PER_YEAR};

/// Fraction of installed power left after system losses given in percent.
pub fn derate(loss_pct: f64) -> f64 {
    (1.0 - loss_pct / 100.0).clamp(0.0, 1.0)
}

/// A synthetic PV array producing a half-sine profile between sunrise and sunset.
///
/// Output is `peak_kw × derate × daylight × season × (1 + noise)`, where the
/// seasonal factor peaks at 1.0 mid-year and bottoms out at
/// `(1 − a) / (1 + a)` in winter for a seasonal amplitude `a`.
#[derive(Debug, Clone)]
pub struct SyntheticSolar {
    /// Installed peak power (kWp).
    pub peak_kw: f64,

    /// System loss in percent.
    pub loss_pct: f64,

    /// Hour of day when production starts (inclusive).
    pub sunrise_hour: usize,

    /// Hour of day when production stops (exclusive).
    pub sunset_hour: usize,

    /// Relative noise standard deviation.
    pub noise_std: f64,

    /// Winter/summer swing, 0.0 to 1.0.
    pub seasonal_amplitude: f64,

    rng: StdRng,
}

impl SyntheticSolar {
    /// Creates a new synthetic PV array.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or `sunset_hour > 24`.
    pub fn new(
        peak_kw: f64,
        loss_pct: f64,
        sunrise_hour: usize,
        sunset_hour: usize,
        noise_std: f64,
        seasonal_amplitude: f64,
        seed: u64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour && sunset_hour <= HOURS_PER_DAY);
        Self {
            peak_kw: peak_kw.max(0.0),
            loss_pct,
            sunrise_hour,
            sunset_hour,
            noise_std: noise_std.max(0.0),
            seasonal_amplitude: seasonal_amplitude.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Half-sine daylight fraction for an hour of the day.
    pub fn daylight_frac(&self, hour_of_day: usize) -> f64 {
        if hour_of_day < self.sunrise_hour || hour_of_day >= self.sunset_hour {
            return 0.0;
        }
        let span = (self.sunset_hour - self.sunrise_hour) as f64;
        let x = (hour_of_day - self.sunrise_hour) as f64 / span;
        (std::f64::consts::PI * x).sin().max(0.0)
    }

    /// Seasonal factor for a day of the year, 1.0 at mid-year.
    pub fn season_frac(&self, day_of_year: usize) -> f64 {
        let a = self.seasonal_amplitude;
        let angle = 2.0 * std::f64::consts::PI * (day_of_year % DAYS_PER_YEAR) as f64
            / DAYS_PER_YEAR as f64;
        (1.0 - a * angle.cos()) / (1.0 + a)
    }

    /// Production in a single hour; never negative.
    pub fn production_kwh(&mut self, hour: usize) -> f64 {
        let frac = self.daylight_frac(hour % HOURS_PER_DAY);
        if frac <= 0.0 {
            return 0.0;
        }
        let season = self.season_frac(hour / HOURS_PER_DAY);
        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.peak_kw * derate(self.loss_pct) * frac * season * noise_mult).max(0.0)
    }
}

impl HourlySource for SyntheticSolar {
    fn hourly_series(&mut self, hours: usize) -> Result<Vec<f64>, SourceError> {
        Ok((0..hours).map(|h| self.production_kwh(h)).collect())
    }

    fn source_type(&self) -> &'static str {
        "SyntheticSolar"
    }
}

/// PV production from an hourly per-kWp profile (e.g. a PVGIS export).
///
/// The profile must hold exactly one year of hourly values. It is repeated
/// across the horizon and scaled by `peak_kw × derate(loss_pct)`.
#[derive(Debug, Clone)]
pub struct CsvSolar {
    path: PathBuf,
    peak_kw: f64,
    loss_pct: f64,
    profile: Option<Vec<f64>>,
}

impl CsvSolar {
    pub fn from_path(path: impl Into<PathBuf>, peak_kw: f64, loss_pct: f64) -> Self {
        Self {
            path: path.into(),
            peak_kw,
            loss_pct,
            profile: None,
        }
    }

    pub fn from_profile(profile: Vec<f64>, peak_kw: f64, loss_pct: f64) -> Self {
        Self {
            path: PathBuf::new(),
            peak_kw,
            loss_pct,
            profile: Some(profile),
        }
    }
}

impl HourlySource for CsvSolar {
    fn hourly_series(&mut self, hours: usize) -> Result<Vec<f64>, SourceError> {
        if self.profile.is_none() {
            self.profile = Some(read_hourly_csv(&self.path)?);
        }
        let scale = self.peak_kw * derate(self.loss_pct);
        let profile = self.profile.as_deref().unwrap_or_default();
        require_one_year(profile, &self.path.display().to_string())?;
        Ok(repeat_profile(profile, hours)
            .into_iter()
            .map(|kwh| (kwh * scale).max(0.0))
            .collect())
    }

    fn source_type(&self) -> &'static str {
        "CsvSolar"
    }
}
