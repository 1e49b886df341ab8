use std::{collections::BTreeMap, fmt::Write, str::FromStr};

use chrono::Weekday;
use itertools::Itertools;
use num_format::{Locale, ToFormattedString};
use shared::{
    Clock, CommitStats, DayPeriod, IntoEnumIterator, LanguagePerRepo, LanguageStats,
    WEEK_FROM_SUNDAY,
};
use strum::{AsRefStr, EnumString};
use tracing::warn;

use crate::{
    api::wakatime::{StatsItem, StatsRange, TimeTrackingStats},
    assembler::Stats,
    config::{RenderConfig, DEFAULT_TIME_LAYOUT},
};

const NAME_WIDTH: usize = 25;
const DESCRIPTION_WIDTH: usize = 20;
const BAR_CELLS: usize = 25;
const PERCENT_PER_CELL: f64 = 100.0 / BAR_CELLS as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Widget {
    LanguagePerRepo,
    LanguagesAndTools,
    CommitDaysOfWeek,
    CommitTimeOfDay,
    CommitStreak,
    CommitYearly,
    CommitQuarterly,
    WakatimeSpentTime,
}

/// Breakdowns of the time-tracking summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeCategory {
    Languages,
    Editors,
    OperatingSystems,
    Projects,
}

impl TimeCategory {
    const fn label(&self) -> &'static str {
        match self {
            TimeCategory::Languages => "💬 Languages:",
            TimeCategory::Editors => "📝 Editors:",
            TimeCategory::OperatingSystems => "💻 Operating Systems:",
            TimeCategory::Projects => "📦 Projects:",
        }
    }

    fn items<'a>(&self, stats: &'a TimeTrackingStats) -> &'a [StatsItem] {
        match self {
            TimeCategory::Languages => &stats.languages,
            TimeCategory::Editors => &stats.editors,
            TimeCategory::OperatingSystems => &stats.operating_systems,
            TimeCategory::Projects => &stats.projects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressBar {
    #[default]
    V1,
    V2,
}

impl ProgressBar {
    pub fn draw(&self, percent: f64) -> String {
        let percent = percent.clamp(0.0, 100.0);
        match self {
            ProgressBar::V1 => {
                let filled = ((percent / PERCENT_PER_CELL).round() as usize).min(BAR_CELLS);
                format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
            }
            ProgressBar::V2 => {
                let filled = ((percent / PERCENT_PER_CELL).floor() as usize).min(BAR_CELLS);
                let half = usize::from(percent - filled as f64 * PERCENT_PER_CELL > 0.0)
                    .min(BAR_CELLS - filled);
                format!(
                    "{}{}{}",
                    "🟩".repeat(filled),
                    "🟨".repeat(half),
                    "⬜".repeat(BAR_CELLS - filled - half)
                )
            }
        }
    }
}

/// One line of a fixed-width list.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: String,
    description: String,
    percent: f64,
}

impl Row {
    fn new(name: impl Into<String>, description: impl Into<String>, percent: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            percent,
        }
    }

    fn format(&self, bar: ProgressBar) -> String {
        format!(
            "\n{}{}{}   {}",
            pad(&self.name, NAME_WIDTH),
            pad(&self.description, DESCRIPTION_WIDTH),
            bar.draw(self.percent),
            format_percent(self.percent)
        )
    }
}

/// Renders the configured widgets, in the configured order, into markdown.
pub struct Renderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, stats: &Stats, clock: &dyn Clock) -> String {
        let mut output: String = self
            .config
            .widgets
            .iter()
            .map(|widget| self.widget(*widget, stats))
            .collect();

        if self.config.show_last_update {
            output.push_str(&format!(
                "\n\n⏳ *Last updated on {}*",
                self.timestamp(clock)
            ));
        }

        output
    }

    fn widget(&self, widget: Widget, stats: &Stats) -> String {
        match widget {
            Widget::LanguagePerRepo => self.language_per_repo(&stats.language_per_repo),
            Widget::LanguagesAndTools => languages_and_tools(&stats.languages),
            Widget::CommitDaysOfWeek => self.commit_days_of_week(&stats.commit_stats),
            Widget::CommitTimeOfDay => self.commit_time_of_day(&stats.commit_stats),
            Widget::CommitStreak => commit_streak(&stats.commit_stats),
            Widget::CommitYearly => self.commit_yearly(&stats.commit_stats),
            Widget::CommitQuarterly => self.commit_quarterly(&stats.commit_stats),
            Widget::WakatimeSpentTime => self.time_spent(stats.time_tracking.as_ref()),
        }
    }

    fn list(&self, rows: &[Row]) -> String {
        if rows.is_empty() {
            return "\nNo data available\n".to_string();
        }

        let lines = rows.iter().map(|row| row.format(self.config.progress_bar)).join("");
        format!("{lines}\n")
    }

    fn block(&self, title: &str, rows: &[Row]) -> String {
        format!("**{title}**\n\n```text{}```\n\n", self.list(rows))
    }

    fn language_per_repo(&self, languages: &LanguagePerRepo) -> String {
        let Some((top, _)) = languages.top() else {
            return String::new();
        };

        let rows: Vec<Row> = languages
            .by_count()
            .into_iter()
            .map(|(name, count)| {
                Row::new(
                    name,
                    counted(count, "repo", "repos"),
                    languages.share(name) * 100.0,
                )
            })
            .collect();

        self.block(&format!("🔥 I Mostly Code in {top}"), &rows)
    }

    fn commit_days_of_week(&self, stats: &CommitStats) -> String {
        let Some(top) = stats.most_productive_weekday() else {
            return String::new();
        };

        let rows: Vec<Row> = WEEK_FROM_SUNDAY
            .iter()
            .map(|weekday| {
                let count = stats.on_weekday(*weekday);
                Row::new(
                    weekday_name(*weekday),
                    counted(count, "commit", "commits"),
                    percent_of(count, stats.total_commits),
                )
            })
            .collect();

        self.block(
            &format!("📅 I'm Most Productive on {}", weekday_name(top)),
            &rows,
        )
    }

    fn commit_time_of_day(&self, stats: &CommitStats) -> String {
        let Some(top) = stats.most_active_day_period() else {
            return String::new();
        };

        let rows: Vec<Row> = DayPeriod::iter()
            .map(|period| {
                let count = stats.in_day_period(period);
                Row::new(
                    format!("{} {}", day_period_emoji(period), period.name()),
                    counted(count, "commit", "commits"),
                    percent_of(count, stats.total_commits),
                )
            })
            .collect();

        self.block(&format!("🕒 I'm {}", day_period_status(top)), &rows)
    }

    fn commit_yearly(&self, stats: &CommitStats) -> String {
        self.counts_block("📆 Commits per Year", &stats.yearly, stats.total_commits)
    }

    fn commit_quarterly(&self, stats: &CommitStats) -> String {
        self.counts_block(
            "🗓️ Commits per Quarter",
            &stats.quarterly,
            stats.total_commits,
        )
    }

    fn counts_block<K: ToString>(
        &self,
        title: &str,
        counts: &BTreeMap<K, u32>,
        total: u32,
    ) -> String {
        if total == 0 {
            return String::new();
        }

        let rows: Vec<Row> = counts
            .iter()
            .map(|(key, count)| {
                Row::new(
                    key.to_string(),
                    counted(*count, "commit", "commits"),
                    percent_of(*count, total),
                )
            })
            .collect();

        self.block(title, &rows)
    }

    fn time_spent(&self, stats: Option<&TimeTrackingStats>) -> String {
        let Some(stats) = stats else {
            return String::new();
        };
        if self.config.time_categories.is_empty() {
            return String::new();
        }

        let body = self
            .config
            .time_categories
            .iter()
            .map(|category| {
                format!(
                    "{}{}",
                    category.label(),
                    self.list(&time_rows(category.items(stats)))
                )
            })
            .join("\n");

        let title = stats
            .range
            .as_deref()
            .and_then(|range| StatsRange::from_str(range).ok())
            .unwrap_or_default()
            .title();

        format!("**📊 {title}**\n\n```text\n{body}```\n\n")
    }

    fn timestamp(&self, clock: &dyn Clock) -> String {
        let now = clock.local_now();
        let mut formatted = String::new();
        if write!(formatted, "{}", now.format(&self.config.time_layout)).is_ok() {
            return formatted;
        }

        warn!(
            "Invalid time layout {:?}, using the default one",
            self.config.time_layout
        );
        now.format(DEFAULT_TIME_LAYOUT).to_string()
    }
}

fn languages_and_tools(languages: &LanguageStats) -> String {
    if languages.total_size == 0 {
        return String::new();
    }

    let badges: String = languages
        .by_size()
        .into_iter()
        .map(|(name, total)| {
            let label = badge_escape(name);
            let color = total
                .color
                .as_deref()
                .map(|color| color.trim_start_matches('#'))
                .unwrap_or("grey");
            format!(
                "![{name}](https://img.shields.io/badge/{label}-{:05.2}%25-{color}?&logo={label}&labelColor=151b23)\n",
                languages.share(name) * 100.0
            )
        })
        .collect();

    format!("**💬 Languages & Tools**\n\n{badges}\n\n")
}

fn commit_streak(stats: &CommitStats) -> String {
    let streaks = stats.streaks;
    if streaks.current == 0 && streaks.longest == 0 {
        return String::new();
    }

    format!(
        "**📈 Coding Streak**\n\n```text\n🔥 Current Streak: {}\n🏆 Longest Streak: {}\n```\n\n",
        counted(streaks.current, "day", "days"),
        counted(streaks.longest, "day", "days")
    )
}

// Short entries and the upstream "Other" bucket are folded into one "Others" row.
fn time_rows(items: &[StatsItem]) -> Vec<Row> {
    let (others, shown): (Vec<&StatsItem>, Vec<&StatsItem>) = items
        .iter()
        .partition(|item| item.name == "Other" || (item.hours == 0 && item.minutes < 10));

    let mut rows: Vec<Row> = shown
        .into_iter()
        .map(|item| Row::new(&item.name, &item.text, item.percent))
        .collect();

    let percent: f64 = others.iter().map(|item| item.percent).sum();
    if percent > 0.0 {
        let hours = others.iter().map(|item| item.hours).sum();
        let minutes = others.iter().map(|item| item.minutes).sum();
        rows.push(Row::new("Others", format_time(hours, minutes), percent));
    }

    rows
}

fn format_time(hours: u64, minutes: u64) -> String {
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(counted(hours, "hr", "hrs"));
    }
    if minutes > 0 {
        parts.push(counted(minutes, "min", "mins"));
    }
    parts.join(" ")
}

fn format_percent(percent: f64) -> String {
    format!("{percent:05.2}%")
}

fn percent_of(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

fn counted<N: Into<u64>>(count: N, one: &str, many: &str) -> String {
    let count: u64 = count.into();
    format!(
        "{} {}",
        count.to_formatted_string(&Locale::en),
        if count > 1 { many } else { one }
    )
}

fn pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    let padding = width - truncated.chars().count();
    format!("{truncated}{}", " ".repeat(padding))
}

// shields.io treats `-` and `_` as separators.
fn badge_escape(text: &str) -> String {
    text.replace('-', "--")
        .replace('_', "__")
        .replace(' ', "%20")
}

const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

const fn day_period_emoji(period: DayPeriod) -> &'static str {
    match period {
        DayPeriod::Morning => "🌅",
        DayPeriod::Daytime => "🌞",
        DayPeriod::Evening => "🌆",
        DayPeriod::Night => "🌙",
    }
}

const fn day_period_status(period: DayPeriod) -> &'static str {
    match period {
        DayPeriod::Morning => "An Early Bird 🐤",
        DayPeriod::Daytime => "An Afternoon Warrior 🥷🏻",
        DayPeriod::Evening => "A Twilight Taskmaster 🌆",
        DayPeriod::Night => "A Night Owl 🦉",
    }
}
