//! Scenario configuration (TOML or JSON) and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sim::calendar::{HOURS_PER_YEAR, ReportPeriod};
use crate::sim::strategy::StrategyKind;
use crate::sim::tariff::{Tariff, TariffBand};
use crate::sim::types::StorageParams;

/// Top-level scenario configuration.
///
/// Unknown keys are ignored so configuration files written for richer
/// front-ends still load. Keys without a sensible default (`end_year`, the
/// solar datasource and both tariffs) are `Option`s so a missing key is
/// reported by [`ScenarioConfig::validate`] with its dotted path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioConfig {
    /// Horizon and strategy selection.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Site location (informational).
    #[serde(default)]
    pub location: LocationConfig,
    /// Demand source parameters.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Solar source parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Storage parameters.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Grid connection limits.
    #[serde(default)]
    pub grid: GridConfig,
    /// Tariffs and emission factor.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Post-processing options.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Horizon and strategy selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// First simulated calendar year. Defaults to `end_year`.
    pub start_year: Option<i32>,
    /// Last simulated calendar year (required).
    pub end_year: Option<i32>,
    /// Overrides the year-derived horizon, in hours.
    pub horizon_hours: Option<usize>,
    /// Dispatch strategy: `"greedy_daily"` or `"grid_only"`.
    pub strategy: String,
    /// Seed for synthetic data sources.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_year: None,
            end_year: None,
            horizon_hours: None,
            strategy: "greedy_daily".to_string(),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Demand source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// `"synthetic"` or `"csv"`.
    pub source: String,
    /// One-year hourly profile, required when `source = "csv"`.
    pub path: Option<String>,
    /// Yearly demand multiplier applied from the second year on.
    pub growth_factor: f64,
    /// Synthetic baseline consumption (kWh per hour).
    pub base_kw: f64,
    /// Synthetic daily amplitude (kWh per hour).
    pub amp_kw: f64,
    /// Synthetic phase offset (radians).
    pub phase_rad: f64,
    /// Synthetic Gaussian noise standard deviation (kWh per hour).
    pub noise_std: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            source: "synthetic".to_string(),
            path: None,
            growth_factor: 1.0,
            base_kw: 0.8,
            amp_kw: 0.7,
            phase_rad: 1.2,
            noise_std: 0.05,
        }
    }
}

/// Solar source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolarConfig {
    /// `"synthetic"` or `"csv"` (required).
    pub datasource: Option<String>,
    /// Installed peak power (kWp).
    pub peakpower: f64,
    /// System loss in percent.
    pub loss: f64,
    /// Hourly production file, required when `datasource = "csv"`.
    pub path: Option<String>,
    /// Synthetic sunrise hour of day (inclusive).
    pub sunrise_hour: usize,
    /// Synthetic sunset hour of day (exclusive).
    pub sunset_hour: usize,
    /// Synthetic relative noise standard deviation.
    pub noise_std: f64,
    /// Synthetic winter/summer swing (0.0 to 1.0).
    pub seasonal_amplitude: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            datasource: None,
            peakpower: 1.0,
            loss: 14.0,
            path: None,
            sunrise_hour: 6,
            sunset_hour: 18,
            noise_std: 0.05,
            seasonal_amplitude: 0.4,
        }
    }
}

/// Storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Usable capacity (kWh). Zero disables storage.
    pub capacity_kwh: f64,
    /// Level at the start of the run (kWh).
    pub initial_level_kwh: f64,
    /// Charge limit per hour (kW). Unbounded when absent.
    pub max_charge_kw: Option<f64>,
    /// Discharge limit per hour (kW). Unbounded when absent.
    pub max_discharge_kw: Option<f64>,
    /// Charge efficiency (0.0 to 1.0].
    pub eta_charge: f64,
    /// Discharge efficiency (0.0 to 1.0].
    pub eta_discharge: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 0.0,
            initial_level_kwh: 0.0,
            max_charge_kw: None,
            max_discharge_kw: None,
            eta_charge: 1.0,
            eta_discharge: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Export ceiling per hour (kW). Unbounded when absent.
    pub max_export_kw: Option<f64>,
}

/// Tariffs and emission factor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Flat import price per kWh (required).
    pub import_per_kwh: Option<f64>,
    /// Flat export price per kWh (required).
    pub export_per_kwh: Option<f64>,
    /// Grid import emission factor (kg CO2 per kWh).
    pub emission_kg_per_kwh: f64,
    /// Time-of-use bands over the hour of day; the first match wins.
    pub bands: Vec<TariffBandConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffBandConfig {
    /// First hour of day covered (inclusive).
    pub start_hour: usize,
    /// Hour of day the band ends (exclusive); may wrap past midnight.
    pub end_hour: usize,
    pub import_per_kwh: f64,
    pub export_per_kwh: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// `"month"` or `"year"`.
    pub period: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period: "month".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"tariff.import_per_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn missing(field: &str) -> Self {
        Self::new(field, "missing required key")
    }
}


impl ScenarioConfig {
    /// Residential site, 4 kWp array, no storage, flat tariff.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig {
                end_year: Some(2024),
                ..SimulationConfig::default()
            },
            location: LocationConfig {
                name: "Demo site".to_string(),
                ..LocationConfig::default()
            },
            demand: DemandConfig::default(),
            solar: SolarConfig {
                datasource: Some("synthetic".to_string()),
                peakpower: 4.0,
                ..SolarConfig::default()
            },
            storage: StorageConfig::default(),
            grid: GridConfig::default(),
            tariff: TariffConfig {
                import_per_kwh: Some(0.20),
                export_per_kwh: Some(0.05),
                emission_kg_per_kwh: 0.4,
                bands: Vec::new(),
            },
            report: ReportConfig::default(),
        }
    }

    /// Baseline plus a 10 kWh home battery with 5 kW power limits.
    pub fn home_battery() -> Self {
        Self {
            storage: StorageConfig {
                capacity_kwh: 10.0,
                initial_level_kwh: 5.0,
                max_charge_kw: Some(5.0),
                max_discharge_kw: Some(5.0),
                eta_charge: 0.95,
                eta_discharge: 0.95,
            },
            ..Self::baseline()
        }
    }

    /// Home battery over three years with peak/off-peak tariffs and demand growth.
    pub fn time_of_use() -> Self {
        let home = Self::home_battery();
        Self {
            simulation: SimulationConfig {
                start_year: Some(2024),
                end_year: Some(2026),
                ..SimulationConfig::default()
            },
            demand: DemandConfig {
                growth_factor: 1.028,
                ..DemandConfig::default()
            },
            grid: GridConfig {
                max_export_kw: Some(3.0),
            },
            tariff: TariffConfig {
                bands: vec![
                    TariffBandConfig {
                        start_hour: 17,
                        end_hour: 21,
                        import_per_kwh: 0.35,
                        export_per_kwh: 0.08,
                    },
                    TariffBandConfig {
                        start_hour: 23,
                        end_hour: 6,
                        import_per_kwh: 0.12,
                        export_per_kwh: 0.02,
                    },
                ],
                ..home.tariff.clone()
            },
            report: ReportConfig {
                period: "year".to_string(),
            },
            ..home
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "home_battery", "time_of_use"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "home_battery" => Ok(Self::home_battery()),
            "time_of_use" => Ok(Self::time_of_use()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario file, picking JSON for `.json` and TOML otherwise.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Parses a scenario from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the JSON is invalid.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::new("json", e.to_string()))
    }

    /// First simulated year, falling back to `end_year`.
    pub fn start_year(&self) -> Option<i32> {
        self.simulation.start_year.or(self.simulation.end_year)
    }

    /// Simulation horizon in hours, if the years are known.
    pub fn horizon_hours(&self) -> Option<usize> {
        if let Some(hours) = self.simulation.horizon_hours {
            return Some(hours);
        }
        let start = self.start_year()?;
        let end = self.simulation.end_year?;
        let years = usize::try_from(end - start + 1).ok()?;
        Some(years * HOURS_PER_YEAR)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        match (s.start_year, s.end_year) {
            (_, None) => errors.push(ConfigError::missing("simulation.end_year")),
            (Some(start), Some(end)) if start > end => errors.push(ConfigError::new(
                "simulation.start_year",
                "must be <= simulation.end_year",
            )),
            _ => {}
        }
        if s.horizon_hours == Some(0) {
            errors.push(ConfigError::new("simulation.horizon_hours", "must be > 0"));
        }
        if s.strategy.parse::<StrategyKind>().is_err() {
            errors.push(ConfigError::new(
                "simulation.strategy",
                format!(
                    "must be \"greedy_daily\" or \"grid_only\", got \"{}\"",
                    s.strategy
                ),
            ));
        }

        let d = &self.demand;
        match d.source.as_str() {
            "synthetic" => {}
            "csv" => {
                if d.path.is_none() {
                    errors.push(ConfigError::missing("demand.path"));
                }
            }
            other => errors.push(ConfigError::new(
                "demand.source",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
        if !(d.growth_factor.is_finite() && d.growth_factor > 0.0) {
            errors.push(ConfigError::new("demand.growth_factor", "must be > 0"));
        }
        for (field, value) in [("demand.base_kw", d.base_kw), ("demand.noise_std", d.noise_std)] {
            if !is_non_negative(value) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        for (field, value) in [("demand.amp_kw", d.amp_kw), ("demand.phase_rad", d.phase_rad)] {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }

        let sol = &self.solar;
        match sol.datasource.as_deref() {
            None => errors.push(ConfigError::missing("solar.datasource")),
            Some("synthetic") => {
                if sol.sunrise_hour >= sol.sunset_hour {
                    errors.push(ConfigError::new(
                        "solar.sunrise_hour",
                        "must be < solar.sunset_hour",
                    ));
                }
                if sol.sunset_hour > 24 {
                    errors.push(ConfigError::new("solar.sunset_hour", "must be <= 24"));
                }
            }
            Some("csv") => {
                if sol.path.is_none() {
                    errors.push(ConfigError::missing("solar.path"));
                }
            }
            Some(other) => errors.push(ConfigError::new(
                "solar.datasource",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
        if !is_non_negative(sol.peakpower) {
            errors.push(ConfigError::new("solar.peakpower", "must be >= 0"));
        }
        if !(0.0..=100.0).contains(&sol.loss) {
            errors.push(ConfigError::new("solar.loss", "must be in [0, 100]"));
        }
        if !is_non_negative(sol.noise_std) {
            errors.push(ConfigError::new("solar.noise_std", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&sol.seasonal_amplitude) {
            errors.push(ConfigError::new(
                "solar.seasonal_amplitude",
                "must be in [0.0, 1.0]",
            ));
        }

        let st = &self.storage;
        if !is_non_negative(st.capacity_kwh) {
            errors.push(ConfigError::new("storage.capacity_kwh", "must be >= 0"));
        }
        if !(is_non_negative(st.initial_level_kwh)
            && st.initial_level_kwh <= st.capacity_kwh.max(0.0))
        {
            errors.push(ConfigError::new(
                "storage.initial_level_kwh",
                "must be in [0, storage.capacity_kwh]",
            ));
        }
        for (field, limit) in [
            ("storage.max_charge_kw", st.max_charge_kw),
            ("storage.max_discharge_kw", st.max_discharge_kw),
            ("grid.max_export_kw", self.grid.max_export_kw),
        ] {
            if limit.is_some_and(|kw| !is_non_negative(kw)) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        for (field, eta) in [
            ("storage.eta_charge", st.eta_charge),
            ("storage.eta_discharge", st.eta_discharge),
        ] {
            if !(eta > 0.0 && eta <= 1.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
            }
        }

        let t = &self.tariff;
        for (field, price) in [
            ("tariff.import_per_kwh", t.import_per_kwh),
            ("tariff.export_per_kwh", t.export_per_kwh),
        ] {
            match price {
                None => errors.push(ConfigError::missing(field)),
                Some(p) if !p.is_finite() => {
                    errors.push(ConfigError::new(field, "must be a finite number"));
                }
                Some(_) => {}
            }
        }
        if !is_non_negative(t.emission_kg_per_kwh) {
            errors.push(ConfigError::new("tariff.emission_kg_per_kwh", "must be >= 0"));
        }
        for (i, band) in t.bands.iter().enumerate() {
            if band.start_hour >= 24 || band.end_hour > 24 || band.start_hour == band.end_hour {
                errors.push(ConfigError::new(
                    &format!("tariff.bands[{i}]"),
                    "hours must satisfy start_hour < 24, end_hour <= 24, start_hour != end_hour",
                ));
            }
            if !(band.import_per_kwh.is_finite() && band.export_per_kwh.is_finite()) {
                errors.push(ConfigError::new(
                    &format!("tariff.bands[{i}]"),
                    "prices must be finite numbers",
                ));
            }
        }

        if self.report.period.parse::<ReportPeriod>().is_err() {
            errors.push(ConfigError::new(
                "report.period",
                format!("must be \"month\" or \"year\", got \"{}\"", self.report.period),
            ));
        }

        errors
    }
}

/// Finite and `>= 0`. False for NaN.
fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Immutable, fully resolved configuration handed to the engine.
///
/// Built once per run from a validated [`ScenarioConfig`]; the engine only
/// ever borrows it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub horizon_hours: usize,
    pub strategy: StrategyKind,
    pub storage: StorageParams,
    pub max_export_kw: Option<f64>,
    pub tariff: Tariff,
    pub period: ReportPeriod,
}

impl TryFrom<&ScenarioConfig> for RunConfig {
    type Error = ConfigError;

    /// Resolves a scenario, failing with the first validation error.
    fn try_from(cfg: &ScenarioConfig) -> Result<Self, Self::Error> {
        if let Some(first) = cfg.validate().into_iter().next() {
            return Err(first);
        }

        let missing = |field: &str| ConfigError::missing(field);
        let end_year = cfg
            .simulation
            .end_year
            .ok_or_else(|| missing("simulation.end_year"))?;
        let start_year = cfg.start_year().unwrap_or(end_year);
        let horizon_hours = cfg
            .horizon_hours()
            .ok_or_else(|| ConfigError::new("simulation.horizon_hours", "cannot be derived"))?;
        let strategy = cfg
            .simulation
            .strategy
            .parse()
            .map_err(|e: String| ConfigError::new("simulation.strategy", e))?;
        let period = cfg
            .report
            .period
            .parse()
            .map_err(|e: String| ConfigError::new("report.period", e))?;

        let st = &cfg.storage;
        let storage = StorageParams {
            capacity_kwh: st.capacity_kwh,
            initial_level_kwh: st.initial_level_kwh,
            max_charge_kw: st.max_charge_kw,
            max_discharge_kw: st.max_discharge_kw,
            eta_charge: st.eta_charge,
            eta_discharge: st.eta_discharge,
        };

        let t = &cfg.tariff;
        let tariff = Tariff {
            import_per_kwh: t
                .import_per_kwh
                .ok_or_else(|| missing("tariff.import_per_kwh"))?,
            export_per_kwh: t
                .export_per_kwh
                .ok_or_else(|| missing("tariff.export_per_kwh"))?,
            emission_kg_per_kwh: t.emission_kg_per_kwh,
            bands: t
                .bands
                .iter()
                .map(|b| TariffBand {
                    start_hour: b.start_hour,
                    end_hour: b.end_hour,
                    import_per_kwh: b.import_per_kwh,
                    export_per_kwh: b.export_per_kwh,
                })
                .collect(),
        };

        Ok(Self {
            start_year,
            end_year,
            horizon_hours,
            strategy,
            storage,
            max_export_kw: cfg.grid.max_export_kw,
            tariff,
            period,
        })
    }
}
