//! Hourly PV, storage and grid dispatch simulator.
//!
//! Demand and generation series from [`sources`] are dispatched day by day by
//! a [`sim::DispatchStrategy`] into an [`sim::EnergyLedger`], which the
//! post-processor aggregates into monthly or yearly cost and emission rows.

pub mod cli;
pub mod config;
pub mod error;
/// CSV export of ledgers and reports.
pub mod io;
pub mod reporting;
/// Simulation manager, dispatch strategies and post-processing.
pub mod sim;
/// Hourly demand and generation sources.
pub mod sources;
pub mod telemetry;
