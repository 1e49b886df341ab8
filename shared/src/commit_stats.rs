use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Weekday};

use super::*;

/// Commit cadence derived from a deduplicated commit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub total_commits: u32,
    pub yearly: BTreeMap<i32, u32>,
    /// Keyed by "<year>-Q<quarter>".
    pub quarterly: BTreeMap<TimePeriodString, u32>,
    pub weekdays: HashMap<Weekday, u32>,
    pub day_periods: HashMap<DayPeriod, u32>,
    pub streaks: Streaks,
}

impl CommitStats {
    pub fn calculate(commits: &[Commit], clock: &dyn Clock) -> Self {
        let mut stats = Self {
            streaks: Streaks::from_commits(commits, clock),
            ..Default::default()
        };

        for commit in commits {
            let date = &commit.committed_date;
            *stats.yearly.entry(date.year()).or_default() += 1;
            *stats.quarterly.entry(quarter_string(date)).or_default() += 1;
            *stats.weekdays.entry(date.weekday()).or_default() += 1;
            *stats.day_periods.entry(DayPeriod::of(date)).or_default() += 1;
            stats.total_commits += 1;
        }

        stats
    }

    pub fn on_weekday(&self, weekday: Weekday) -> u32 {
        self.weekdays.get(&weekday).copied().unwrap_or_default()
    }

    pub fn in_day_period(&self, period: DayPeriod) -> u32 {
        self.day_periods.get(&period).copied().unwrap_or_default()
    }

    /// Earliest weekday (starting from Sunday) with the highest count.
    pub fn most_productive_weekday(&self) -> Option<Weekday> {
        let mut best: Option<(Weekday, u32)> = None;
        for weekday in WEEK_FROM_SUNDAY {
            let count = self.on_weekday(weekday);
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((weekday, count));
            }
        }
        best.map(|(weekday, _)| weekday)
    }

    pub fn most_active_day_period(&self) -> Option<DayPeriod> {
        let mut best: Option<(DayPeriod, u32)> = None;
        for period in DayPeriod::iter() {
            let count = self.in_day_period(period);
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((period, count));
            }
        }
        best.map(|(period, _)| period)
    }
}

pub const WEEK_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];
