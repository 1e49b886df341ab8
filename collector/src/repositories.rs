use std::collections::HashSet;

use futures::future::try_join;
use serde_json::json;
use shared::Repository;
use tracing::{info, instrument};

use crate::{
    api::github::{variables, Query, RepositoryNode},
    pagination::PaginatedFetcher,
};

/// Owned and contributed-to repositories of one account, deduplicated by URL.
#[derive(Clone)]
pub struct RepositoryAggregator {
    fetcher: PaginatedFetcher,
    page_size: u32,
    exclude_forks: bool,
}

impl RepositoryAggregator {
    pub fn new(fetcher: PaginatedFetcher, page_size: u32, exclude_forks: bool) -> Self {
        Self {
            fetcher,
            page_size,
            exclude_forks,
        }
    }

    /// Both lists are fetched concurrently. The first failure is returned and
    /// the other fetch is dropped.
    #[instrument(skip(self))]
    pub async fn fetch(&self, account: &str) -> anyhow::Result<Vec<Repository>> {
        let owned = self.fetch_list(Query::OwnedRepositories, account);
        let contributed = self.fetch_list(Query::ContributedRepositories, account);
        let (owned, contributed) = try_join(owned, contributed).await?;

        info!(
            "Fetched {} owned and {} contributed-to repositories",
            owned.len(),
            contributed.len()
        );
        Ok(merge(owned, contributed, self.exclude_forks))
    }

    async fn fetch_list(&self, query: Query, account: &str) -> anyhow::Result<Vec<Repository>> {
        let nodes: Vec<RepositoryNode> = self
            .fetcher
            .fetch_all(query, self.page_size, variables([("username", json!(account))]))
            .await?;

        Ok(nodes.into_iter().map(Repository::from).collect())
    }
}

/// Owned repositories come first, so an owned copy always wins over a
/// contributed-to copy of the same URL.
pub fn merge(
    owned: Vec<Repository>,
    contributed: Vec<Repository>,
    exclude_forks: bool,
) -> Vec<Repository> {
    let mut seen = HashSet::new();

    owned
        .into_iter()
        .chain(contributed)
        .filter(|repo| !(exclude_forks && repo.is_fork))
        .filter(|repo| seen.insert(repo.url.clone()))
        .collect()
}
