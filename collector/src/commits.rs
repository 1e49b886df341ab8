use std::{collections::HashSet, sync::Arc};

use anyhow::Context;
use serde_json::json;
use shared::{Branch, Clock, Commit, Repository};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error, info, instrument};

use crate::{
    api::github::{variables, CommitNode, Named, Query, Variables},
    config::FetchConfig,
    pagination::PaginatedFetcher,
};

/// Collects the viewer's commits across repositories, one task per
/// repository, with at most `max_concurrency` repositories in flight.
pub struct CommitAggregator {
    worker: RepositoryWorker,
    clock: Arc<dyn Clock>,
    semaphore: Arc<Semaphore>,
    hide_repo_info: bool,
}

impl CommitAggregator {
    pub fn new(fetcher: PaginatedFetcher, clock: Arc<dyn Clock>, config: &FetchConfig) -> Self {
        Self {
            worker: RepositoryWorker {
                fetcher,
                branch_page_size: config.branch_page_size,
                commit_page_size: config.commit_page_size,
                fetch_all_branches: config.fetch_all_branches,
            },
            clock,
            semaphore: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            hide_repo_info: config.hide_repo_info,
        }
    }

    /// Commits are deduplicated by OID. When the same commit shows up in several
    /// branches or repositories, the copy from the earliest repository in
    /// `repositories` is kept, whatever order the tasks finish in.
    ///
    /// The first failing repository cancels the run and aborts the other tasks.
    #[instrument(skip(self, repositories), fields(repositories = repositories.len()))]
    pub async fn fetch(
        &self,
        author_id: &str,
        repositories: &[Repository],
    ) -> anyhow::Result<Vec<Commit>> {
        let mut tasks = JoinSet::new();
        for (index, repository) in repositories.iter().cloned().enumerate() {
            let worker = self.worker.clone();
            let semaphore = self.semaphore.clone();
            let author_id = author_id.to_string();
            let label = self.label(&repository);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let nodes = worker
                    .run(&author_id, &repository)
                    .await
                    .with_context(|| format!("Failed to fetch commits of {label}"))?;
                debug!("Fetched {} commits from {label}", nodes.len());
                anyhow::Ok((index, nodes))
            });
        }

        let mut per_repository: Vec<Vec<CommitNode>> =
            repositories.iter().map(|_| Vec::new()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined.context("Commit task failed").and_then(|result| result) {
                Ok((index, nodes)) => per_repository[index] = nodes,
                Err(e) => {
                    error!("Stopping commit aggregation: {e:#}");
                    self.worker.fetcher.cancellation().cancel();
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let fetched: usize = per_repository.iter().map(Vec::len).sum();
        let mut seen = HashSet::new();
        let commits: Vec<Commit> = per_repository
            .into_iter()
            .flatten()
            .filter(|node| seen.insert(node.oid.clone()))
            .map(|node| node.into_commit(self.clock.as_ref()))
            .collect();

        info!(
            "Collected {} unique commits ({fetched} fetched) from {} repositories",
            commits.len(),
            repositories.len()
        );
        Ok(commits)
    }

    fn label(&self, repository: &Repository) -> String {
        if self.hide_repo_info {
            mask(&repository.name)
        } else {
            format!("{}/{}", repository.owner, repository.name)
        }
    }
}

/// Fetches the commit history of a single repository.
#[derive(Clone)]
struct RepositoryWorker {
    fetcher: PaginatedFetcher,
    branch_page_size: u32,
    commit_page_size: u32,
    fetch_all_branches: bool,
}

impl RepositoryWorker {
    async fn run(
        &self,
        author_id: &str,
        repository: &Repository,
    ) -> anyhow::Result<Vec<CommitNode>> {
        let mut nodes = Vec::new();
        for branch in self.branches(repository).await? {
            let mut variables = repository_variables(repository);
            variables.insert("authorId".to_string(), json!(author_id));
            variables.insert("branch".to_string(), json!(branch.qualified_name()));

            let page: Vec<CommitNode> = self
                .fetcher
                .fetch_all(Query::Commits, self.commit_page_size, variables)
                .await?;
            nodes.extend(page);
        }
        Ok(nodes)
    }

    // A repository without a default branch (empty repository) has no commits.
    async fn branches(&self, repository: &Repository) -> anyhow::Result<Vec<Branch>> {
        if self.fetch_all_branches {
            let branches: Vec<Named> = self
                .fetcher
                .fetch_all(
                    Query::Branches,
                    self.branch_page_size,
                    repository_variables(repository),
                )
                .await?;
            return Ok(branches.into_iter().map(Branch::from).collect());
        }

        let default_branch: Option<Named> = self
            .fetcher
            .fetch_one(Query::DefaultBranch, repository_variables(repository))
            .await?;
        Ok(default_branch.into_iter().map(Branch::from).collect())
    }
}

fn repository_variables(repository: &Repository) -> Variables {
    variables([
        ("owner", json!(repository.owner)),
        ("name", json!(repository.name)),
    ])
}

/// Replaces the middle third of `name` with `*`. Names of up to two
/// characters are returned as they are.
pub fn mask(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= 2 {
        return name.to_string();
    }

    let hidden = chars.len() / 3;
    let prefix = (chars.len() - hidden) / 2;
    chars[..prefix]
        .iter()
        .copied()
        .chain(std::iter::repeat('*').take(hidden))
        .chain(chars[prefix + hidden..].iter().copied())
        .collect()
}
