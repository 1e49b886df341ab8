use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::*;

/// Consecutive calendar days with at least one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

impl Streaks {
    /// `today` must be taken from the same timezone the commit days were
    /// truncated in.
    pub fn from_days(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Self {
        // Most recent first, one entry per calendar day.
        let days: Vec<NaiveDate> = days
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .rev()
            .collect();

        let Some(&most_recent) = days.first() else {
            return Self::default();
        };

        let current = if most_recent == today || is_day_before(today, most_recent) {
            1 + days
                .windows(2)
                .take_while(|pair| is_day_before(pair[0], pair[1]))
                .count() as u32
        } else {
            0
        };

        let mut longest = 1;
        let mut run = 1;
        for pair in days.windows(2) {
            if is_day_before(pair[0], pair[1]) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
        }

        Self {
            current,
            longest: longest.max(current),
        }
    }

    pub fn from_commits(commits: &[Commit], clock: &dyn Clock) -> Self {
        let timezone = clock.timezone();
        Self::from_days(
            commits
                .iter()
                .map(|commit| commit.committed_date.with_timezone(&timezone).date_naive()),
            clock.today(),
        )
    }
}

// Whole calendar days, so DST transitions never stretch or shrink a gap.
fn is_day_before(later: NaiveDate, earlier: NaiveDate) -> bool {
    later.signed_duration_since(earlier).num_days() == 1
}
