/// Per-hour energy balance checks.
pub mod balance;
/// Hour-index to calendar-period mapping.
pub mod calendar;
pub mod manager;
pub mod post;
pub mod progress;
pub mod strategy;
/// Flat and time-of-use tariffs.
pub mod tariff;
pub mod types;

pub use manager::run_simulation;
pub use post::{PeriodRow, PostProcessResult, run_post_processing};
pub use progress::{CancelToken, NoProgress, ProgressSink, RunControl};
pub use strategy::{DispatchStrategy, GreedyDailyStrategy, GridOnlyStrategy, StrategyKind};
pub use types::{EnergyLedger, LedgerRow};
