use std::{path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::warn;

use crate::{
    api::wakatime::StatsRange,
    render::{ProgressBar, TimeCategory, Widget},
};

pub const DEFAULT_SECTION_NAME: &str = "readme-stats";
pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Raw process environment, as read by `envy`.
#[derive(Debug, Default, Deserialize)]
pub struct Env {
    pub github_token: String,
    pub wakatime_api_key: Option<String>,
    pub wakatime_range: Option<String>,
    #[serde(default)]
    pub wakatime_data: Vec<String>,
    pub time_zone: Option<String>,
    #[serde(default)]
    pub only_main_branch: bool,
    #[serde(default)]
    pub exclude_fork_repos: bool,
    #[serde(default)]
    pub hide_repo_info: bool,
    #[serde(default)]
    pub show_metrics: Vec<String>,
    #[serde(default)]
    pub show_last_update: bool,
    pub time_layout: Option<String>,
    pub progress_bar_version: Option<String>,
    pub section_name: Option<String>,
    pub readme_path: Option<PathBuf>,
    pub repo_page_size: Option<u32>,
    pub branch_page_size: Option<u32>,
    pub commit_page_size: Option<u32>,
    pub max_concurrency: Option<usize>,
    pub run_timeout_in_seconds: Option<u64>,
}

/// Everything the aggregation pipeline needs to know about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub repo_page_size: u32,
    pub branch_page_size: u32,
    pub commit_page_size: u32,
    /// `false` restricts commit history to each repository's default branch.
    pub fetch_all_branches: bool,
    pub exclude_forks: bool,
    pub hide_repo_info: bool,
    pub max_concurrency: usize,
    pub wakatime_range: StatsRange,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            repo_page_size: 25,
            branch_page_size: 30,
            commit_page_size: 100,
            fetch_all_branches: true,
            exclude_forks: false,
            hide_repo_info: false,
            max_concurrency: 10,
            wakatime_range: StatsRange::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub widgets: Vec<Widget>,
    pub time_categories: Vec<TimeCategory>,
    pub show_last_update: bool,
    pub time_layout: String,
    pub progress_bar: ProgressBar,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
            time_categories: Vec::new(),
            show_last_update: false,
            time_layout: DEFAULT_TIME_LAYOUT.to_string(),
            progress_bar: ProgressBar::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub wakatime_api_key: Option<String>,
    pub timezone: Tz,
    pub fetch: FetchConfig,
    pub render: RenderConfig,
    pub section_name: String,
    pub readme_path: PathBuf,
    pub run_timeout: Option<Duration>,
}

impl TryFrom<Env> for Config {
    type Error = anyhow::Error;

    fn try_from(env: Env) -> anyhow::Result<Self> {
        if env.github_token.is_empty() {
            anyhow::bail!("GITHUB_TOKEN is required");
        }

        let timezone = match non_empty(env.time_zone) {
            Some(name) => Tz::from_str(&name)
                .map_err(|e| anyhow::anyhow!("Invalid timezone {name}: {e}"))?,
            None => Tz::UTC,
        };

        let wakatime_range = match non_empty(env.wakatime_range) {
            Some(range) => StatsRange::from_str(&range).unwrap_or_else(|_| {
                warn!("Unknown WakaTime range {range}, falling back to last_7_days");
                StatsRange::default()
            }),
            None => StatsRange::default(),
        };

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            repo_page_size: env.repo_page_size.unwrap_or(defaults.repo_page_size),
            branch_page_size: env.branch_page_size.unwrap_or(defaults.branch_page_size),
            commit_page_size: env.commit_page_size.unwrap_or(defaults.commit_page_size),
            fetch_all_branches: !env.only_main_branch,
            exclude_forks: env.exclude_fork_repos,
            hide_repo_info: env.hide_repo_info,
            max_concurrency: env
                .max_concurrency
                .unwrap_or(defaults.max_concurrency)
                .max(1),
            wakatime_range,
        };

        let render = RenderConfig {
            widgets: parse_list(&env.show_metrics),
            time_categories: parse_list(&env.wakatime_data),
            show_last_update: env.show_last_update,
            time_layout: non_empty(env.time_layout)
                .unwrap_or_else(|| DEFAULT_TIME_LAYOUT.to_string()),
            progress_bar: match env.progress_bar_version.as_deref() {
                Some("2") => ProgressBar::V2,
                _ => ProgressBar::V1,
            },
        };

        Ok(Self {
            github_token: env.github_token,
            wakatime_api_key: non_empty(env.wakatime_api_key),
            timezone,
            fetch,
            render,
            section_name: non_empty(env.section_name)
                .unwrap_or_else(|| DEFAULT_SECTION_NAME.to_string()),
            readme_path: env.readme_path.unwrap_or_else(|| PathBuf::from("README.md")),
            run_timeout: env.run_timeout_in_seconds.map(Duration::from_secs),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// Unknown entries are skipped, the order of the known ones is kept.
fn parse_list<T: FromStr>(values: &[String]) -> Vec<T> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .filter_map(|value| match T::from_str(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!("Skipping unknown entry {value}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Env {
        Env {
            github_token: "token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::try_from(env()).unwrap();

        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.fetch, FetchConfig::default());
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.section_name, DEFAULT_SECTION_NAME);
        assert_eq!(config.wakatime_api_key, None);
        assert_eq!(config.run_timeout, None);
    }

    #[test]
    fn token_is_required() {
        assert!(Config::try_from(Env::default()).is_err());
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        let env = Env {
            time_zone: Some("Mars/Olympus_Mons".to_string()),
            ..env()
        };

        assert!(Config::try_from(env).is_err());
    }

    #[test]
    fn full_env() {
        let env = Env {
            time_zone: Some("Asia/Ho_Chi_Minh".to_string()),
            only_main_branch: true,
            exclude_fork_repos: true,
            wakatime_api_key: Some(" ".to_string()),
            wakatime_range: Some("last_year".to_string()),
            wakatime_data: vec!["EDITORS".to_string(), "NOPE".to_string(), "LANGUAGES".to_string()],
            show_metrics: vec![
                "COMMIT_TIME_OF_DAY".to_string(),
                "LANGUAGE_PER_REPO".to_string(),
                "UNKNOWN".to_string(),
            ],
            progress_bar_version: Some("2".to_string()),
            max_concurrency: Some(0),
            run_timeout_in_seconds: Some(60),
            ..env()
        };

        let config = Config::try_from(env).unwrap();

        assert_eq!(config.timezone, chrono_tz::Asia::Ho_Chi_Minh);
        assert!(!config.fetch.fetch_all_branches);
        assert!(config.fetch.exclude_forks);
        assert_eq!(config.fetch.max_concurrency, 1);
        assert_eq!(config.fetch.wakatime_range, StatsRange::LastYear);
        assert_eq!(config.wakatime_api_key, None);
        assert_eq!(
            config.render.widgets,
            vec![Widget::CommitTimeOfDay, Widget::LanguagePerRepo]
        );
        assert_eq!(
            config.render.time_categories,
            vec![TimeCategory::Editors, TimeCategory::Languages]
        );
        assert_eq!(config.render.progress_bar, ProgressBar::V2);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn unknown_wakatime_range_falls_back() {
        let env = Env {
            wakatime_range: Some("last_century".to_string()),
            ..env()
        };

        assert_eq!(
            Config::try_from(env).unwrap().fetch.wakatime_range,
            StatsRange::Last7Days
        );
    }
}
