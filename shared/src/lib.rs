use chrono::{DateTime, Utc};
use chrono_tz::Tz;

mod clock;
mod commit_stats;
mod language;
mod streak;
mod timeperiod;

pub use clock::*;
pub use commit_stats::*;
pub use language::*;
pub use streak::*;
pub use timeperiod::*;

pub type GithubHandle = String;

/// The authenticated account every query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    pub login: GithubHandle,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEdge {
    pub name: String,
    pub color: Option<String>,
    pub size: u64,
}

/// Repositories are identified by `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub url: String,
    pub owner: GithubHandle,
    pub is_fork: bool,
    pub is_private: bool,
    pub primary_language: Option<String>,
    pub languages: Vec<LanguageEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn qualified_name(&self) -> String {
        format!("refs/heads/{}", self.name)
    }
}

/// A commit authored by the viewer. Commits are identified by `oid`, and
/// `committed_date` is already in the configured timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub oid: String,
    pub committed_date: DateTime<Tz>,
    pub additions: u64,
    pub deletions: u64,
}
