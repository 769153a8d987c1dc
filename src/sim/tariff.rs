//! Flat and time-of-use tariffs.

use super::calendar::hour_of_day;

/// Import and export prices applying to one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub import_per_kwh: f64,
    pub export_per_kwh: f64,
}

/// A time-of-use band over the hour of day.
///
/// Covers `[start_hour, end_hour)`. When `start_hour > end_hour` the band
/// wraps past midnight, e.g. 23..6 covers hours 23 and 0 to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffBand {
    pub start_hour: usize,
    pub end_hour: usize,
    pub import_per_kwh: f64,
    pub export_per_kwh: f64,
}

impl TariffBand {
    /// Returns `true` when the band covers the given hour of day.
    pub fn covers(&self, hour_of_day: usize) -> bool {
        if self.start_hour < self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour_of_day)
        } else {
            hour_of_day >= self.start_hour || hour_of_day < self.end_hour
        }
    }
}

/// Tariff and emission parameters consumed by the post-processor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    /// Import price when no band matches.
    pub import_per_kwh: f64,
    /// Export price when no band matches.
    pub export_per_kwh: f64,
    /// Grid import emission factor (kg CO2 per kWh).
    pub emission_kg_per_kwh: f64,
    /// Time-of-use bands, first match wins.
    pub bands: Vec<TariffBand>,
}

impl Tariff {
    /// Flat tariff without time-of-use bands.
    pub fn flat(import_per_kwh: f64, export_per_kwh: f64, emission_kg_per_kwh: f64) -> Self {
        Self {
            import_per_kwh,
            export_per_kwh,
            emission_kg_per_kwh,
            bands: Vec::new(),
        }
    }

    /// Rates applying to an hour offset from the horizon start.
    pub fn rates_at(&self, hour: usize) -> Rates {
        let h = hour_of_day(hour);
        self.bands
            .iter()
            .find(|band| band.covers(h))
            .map_or(
                Rates {
                    import_per_kwh: self.import_per_kwh,
                    export_per_kwh: self.export_per_kwh,
                },
                |band| Rates {
                    import_per_kwh: band.import_per_kwh,
                    export_per_kwh: band.export_per_kwh,
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_band() -> TariffBand {
        TariffBand {
            start_hour: 17,
            end_hour: 21,
            import_per_kwh: 0.35,
            export_per_kwh: 0.08,
        }
    }

    fn night_band() -> TariffBand {
        TariffBand {
            start_hour: 23,
            end_hour: 6,
            import_per_kwh: 0.12,
            export_per_kwh: 0.02,
        }
    }

    #[test]
    fn flat_tariff_everywhere() {
        let t = Tariff::flat(0.2, 0.05, 0.0);
        for h in 0..48 {
            assert_eq!(t.rates_at(h).import_per_kwh, 0.2);
            assert_eq!(t.rates_at(h).export_per_kwh, 0.05);
        }
    }

    #[test]
    fn band_is_half_open() {
        let band = peak_band();
        assert!(!band.covers(16));
        assert!(band.covers(17));
        assert!(band.covers(20));
        assert!(!band.covers(21));
    }

    #[test]
    fn wrapping_band_covers_midnight() {
        let band = night_band();
        assert!(band.covers(23));
        assert!(band.covers(0));
        assert!(band.covers(5));
        assert!(!band.covers(6));
        assert!(!band.covers(22));
    }

    #[test]
    fn banded_rates_follow_hour_of_day() {
        let mut t = Tariff::flat(0.2, 0.05, 0.4);
        t.bands = vec![peak_band(), night_band()];
        // hour 41 = day 1, 17:00
        assert_eq!(t.rates_at(41).import_per_kwh, 0.35);
        // hour 26 = day 1, 02:00
        assert_eq!(t.rates_at(26).export_per_kwh, 0.02);
        // hour 12 = noon, no band
        assert_eq!(t.rates_at(12).import_per_kwh, 0.2);
    }
}
