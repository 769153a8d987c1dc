//! Hour-index to calendar-period mapping.
//!
//! Horizons are whole 365-day years of 8760 hours each. The first hour of the
//! horizon is 00:00 on 1 January of the start year.

use std::fmt;
use std::str::FromStr;

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_YEAR: usize = 365;
pub const HOURS_PER_YEAR: usize = HOURS_PER_DAY * DAYS_PER_YEAR;

const DAYS_IN_MONTH: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Aggregation granularity used by the post-processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPeriod {
    #[default]
    Month,
    Year,
}

impl FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown report period \"{other}\"")),
        }
    }
}

/// Identifies one reporting period.
///
/// Ordering follows the calendar, so keys can be compared to detect period
/// boundaries while walking the ledger in hour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    /// Month 1..=12, absent for yearly periods.
    pub month: Option<u8>,
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{}-{m:02}", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Returns the calendar month (1..=12) for a day of the year (0..365).
pub fn month_of_day(day_of_year: usize) -> u8 {
    let mut remaining = day_of_year % DAYS_PER_YEAR;
    for (i, days) in DAYS_IN_MONTH.iter().enumerate() {
        if remaining < *days {
            return (i + 1) as u8;
        }
        remaining -= days;
    }
    12
}

/// Maps an hour offset from the horizon start to its reporting period.
pub fn period_of(hour: usize, start_year: i32, period: ReportPeriod) -> PeriodKey {
    let year_offset = hour / HOURS_PER_YEAR;
    let year = start_year + year_offset as i32;
    let month = match period {
        ReportPeriod::Year => None,
        ReportPeriod::Month => Some(month_of_day((hour % HOURS_PER_YEAR) / HOURS_PER_DAY)),
    };
    PeriodKey { year, month }
}

/// Hour of the day (0..24) for an hour offset.
pub fn hour_of_day(hour: usize) -> usize {
    hour % HOURS_PER_DAY
}
