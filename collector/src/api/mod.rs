pub mod github;
pub mod wakatime;

pub use github::{GithubClient, GraphQl, Query, Variables};
pub use wakatime::{StatsOutcome, StatsRange, TimeTracking, TimeTrackingStats, WakaTimeClient};
