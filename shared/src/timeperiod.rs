use chrono::{DateTime, Datelike, TimeZone, Timelike};
use strum::EnumIter;

pub use strum::IntoEnumIterator;

pub type TimePeriodString = String;

/// Part of the day a commit was made in.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, EnumIter)]
pub enum DayPeriod {
    Morning,
    Daytime,
    Evening,
    Night,
}

impl DayPeriod {
    /// Hour range `[start, end)`; `Night` wraps around midnight.
    pub const fn hours(&self) -> (u32, u32) {
        match self {
            DayPeriod::Morning => (6, 12),
            DayPeriod::Daytime => (12, 18),
            DayPeriod::Evening => (18, 23),
            DayPeriod::Night => (23, 6),
        }
    }

    pub fn from_hour(hour: u32) -> Self {
        DayPeriod::iter()
            .find(|period| {
                let (start, end) = period.hours();
                if start < end {
                    hour >= start && hour < end
                } else {
                    hour >= start || hour < end
                }
            })
            .unwrap_or(DayPeriod::Night)
    }

    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self::from_hour(timestamp.hour())
    }

    pub const fn name(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Morning",
            DayPeriod::Daytime => "Daytime",
            DayPeriod::Evening => "Evening",
            DayPeriod::Night => "Night",
        }
    }
}

pub fn quarter<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> u32 {
    timestamp.month0() / 3 + 1
}

// e.g. "2024-Q3"
pub fn quarter_string<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> TimePeriodString {
    format!("{}-Q{}", timestamp.year(), quarter(timestamp))
}
