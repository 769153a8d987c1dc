//! Error taxonomy for simulation and post-processing runs.

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors raised by the simulation engine.
///
/// Every variant aborts the run; no partial ledger or report is returned.
/// Degenerate aggregation periods are not errors and never show up here.
#[derive(Debug, Error)]
pub enum SimError {
    /// A required configuration key is missing or invalid.
    #[error("{0}")]
    Configuration(#[from] ConfigError),

    /// Input series do not have the expected shape.
    #[error("shape error: {0}")]
    Shape(String),

    /// An input sample is negative or not finite.
    #[error("invalid {series} sample at hour {hour}: {value}")]
    InvalidSample {
        series: &'static str,
        hour: usize,
        value: f64,
    },

    /// A dispatch result broke the per-hour energy balance.
    #[error("conservation violation at hour {hour}: {detail}")]
    ConservationViolation { hour: usize, detail: String },

    /// The storage level returned by a strategy left `[0, capacity]`.
    #[error("storage level {level_kwh} kWh outside [0, {capacity_kwh}] after day {day}")]
    StorageOutOfBounds {
        day: usize,
        level_kwh: f64,
        capacity_kwh: f64,
    },

    /// The caller cancelled the run at a day boundary.
    #[error("run cancelled after {completed} of {total} steps")]
    Cancelled { completed: usize, total: usize },
}

impl SimError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }
}

/// Errors produced while building hourly input series.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source is not configured: {key}")]
    Unconfigured { key: &'static str },

    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in \"{path}\": {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("\"{path}\" line {line}: cannot parse \"{value}\" as a number")]
    Parse {
        path: String,
        line: usize,
        value: String,
    },

    #[error("\"{path}\" holds {found} hourly values, expected {expected}")]
    Length {
        path: String,
        found: usize,
        expected: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_keeps_offending_key() {
        let err = SimError::from(ConfigError {
            field: "tariff.import_per_kwh".into(),
            message: "missing required key".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("tariff.import_per_kwh"), "{msg}");
    }

    #[test]
    fn conservation_error_names_hour() {
        let err = SimError::ConservationViolation {
            hour: 17,
            detail: "demand side off by 0.5".into(),
        };
        assert!(err.to_string().contains("hour 17"));
    }
}
