use std::{sync::Arc, time::Duration};

use anyhow::Context;
use shared::{Clock, Commit, CommitStats, LanguagePerRepo, LanguageStats, Repository, Viewer};
use tracing::{info, instrument, warn};

use crate::{
    api::{
        github::{GraphQl, Query, Variables, ViewerNode},
        wakatime::{StatsOutcome, StatsRange, TimeTracking, TimeTrackingStats},
    },
    commits::CommitAggregator,
    config::FetchConfig,
    pagination::{Cancellation, PaginatedFetcher},
    repositories::RepositoryAggregator,
};

/// Everything a run collected, ready for rendering.
#[derive(Debug, Clone)]
pub struct Stats {
    pub viewer: Viewer,
    pub repositories: Vec<Repository>,
    pub commits: Vec<Commit>,
    pub languages: LanguageStats,
    pub language_per_repo: LanguagePerRepo,
    pub commit_stats: CommitStats,
    pub time_tracking: Option<TimeTrackingStats>,
}

pub struct StatsAssembler {
    fetcher: PaginatedFetcher,
    time_tracking: Option<Arc<dyn TimeTracking>>,
    clock: Arc<dyn Clock>,
    config: FetchConfig,
}

impl StatsAssembler {
    pub fn new(
        github: Arc<dyn GraphQl>,
        time_tracking: Option<Arc<dyn TimeTracking>>,
        clock: Arc<dyn Clock>,
        config: FetchConfig,
        cancellation: Cancellation,
    ) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(github, cancellation),
            time_tracking,
            clock,
            config,
        }
    }

    /// Viewer, then repositories, then commits, then the derived stats.
    /// Any failure aborts the build.
    #[instrument(skip(self))]
    pub async fn build(&self) -> anyhow::Result<Stats> {
        let viewer: Viewer = self
            .fetcher
            .fetch_one::<ViewerNode>(Query::Viewer, Variables::new())
            .await?
            .map(Viewer::from)
            .context("Viewer query returned no viewer")?;
        info!("Collecting stats of {}", viewer.login);

        let repositories = RepositoryAggregator::new(
            self.fetcher.clone(),
            self.config.repo_page_size,
            self.config.exclude_forks,
        )
        .fetch(&viewer.login)
        .await?;

        let commits = CommitAggregator::new(self.fetcher.clone(), self.clock.clone(), &self.config)
            .fetch(&viewer.id, &repositories)
            .await?;

        let languages = LanguageStats::aggregate(&repositories);
        let language_per_repo = LanguagePerRepo::calculate(&repositories);
        let commit_stats = CommitStats::calculate(&commits, self.clock.as_ref());

        let time_tracking = match &self.time_tracking {
            Some(client) => fetch_time_tracking(client.as_ref(), self.config.wakatime_range).await?,
            None => None,
        };

        Ok(Stats {
            viewer,
            repositories,
            commits,
            languages,
            language_per_repo,
            commit_stats,
            time_tracking,
        })
    }

    /// Same as [`StatsAssembler::build`], but gives up once `deadline` has
    /// elapsed and cancels the outstanding fetches.
    pub async fn build_with_deadline(&self, deadline: Option<Duration>) -> anyhow::Result<Stats> {
        let Some(deadline) = deadline else {
            return self.build().await;
        };

        match tokio::time::timeout(deadline, self.build()).await {
            Ok(stats) => stats,
            Err(_) => {
                self.fetcher.cancellation().cancel();
                anyhow::bail!("Collecting stats took longer than {deadline:?}")
            }
        }
    }
}

/// Maps the time-tracking outcome onto usable data. Only transport and
/// decode failures are errors.
#[instrument(skip(client))]
pub async fn fetch_time_tracking(
    client: &dyn TimeTracking,
    range: StatsRange,
) -> anyhow::Result<Option<TimeTrackingStats>> {
    let stats = match client.fetch_stats(range).await? {
        StatsOutcome::Ready(stats) => stats,
        StatsOutcome::Pending => {
            info!("WakaTime accepted the request but has not computed the stats yet");
            return Ok(Some(TimeTrackingStats {
                range: Some(range.as_ref().to_string()),
                ..Default::default()
            }));
        }
    };

    match stats.status.as_str() {
        "ok" => Ok(Some(stats)),
        "pending_update" => {
            info!("WakaTime is not ready yet");
            Ok(Some(stats))
        }
        status => {
            warn!("WakaTime returned status {status:?}, skipping its data");
            Ok(None)
        }
    }
}
