//! Common types and traits for hourly input series.

use rand::{Rng, rngs::StdRng};

use crate::error::SourceError;
use crate::sim::calendar::HOURS_PER_YEAR;

/// Anything that can produce an hourly energy series.
///
/// Values are kWh per hour, non-negative, one per hour starting at 00:00 on
/// 1 January of the first simulated year.
pub trait HourlySource {
    /// Produces exactly `hours` values.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the underlying data cannot be loaded.
    fn hourly_series(&mut self, hours: usize) -> Result<Vec<f64>, SourceError>;

    /// Human-readable source name for logs.
    fn source_type(&self) -> &'static str;
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns 0.0 when `std_dev` is not positive.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Checks that a profile holds exactly one 365-day year of hourly values.
///
/// # Errors
///
/// Returns [`SourceError::Length`] for any other length, including leap-year
/// exports of 8784 values.
pub fn require_one_year(profile: &[f64], label: &str) -> Result<(), SourceError> {
    if profile.len() != HOURS_PER_YEAR {
        return Err(SourceError::Length {
            path: label.to_string(),
            found: profile.len(),
            expected: HOURS_PER_YEAR,
        });
    }
    Ok(())
}

/// Repeats a profile cyclically to fill `hours` values.
pub fn repeat_profile(profile: &[f64], hours: usize) -> Vec<f64> {
    if profile.is_empty() {
        return vec![0.0; hours];
    }
    profile.iter().copied().cycle().take(hours).collect()
}
