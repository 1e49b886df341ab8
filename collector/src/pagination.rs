use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::github::{Connection, GraphQl, Query, Variables};

/// Run-wide stop signal, checked before every request.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.is_cancelled() {
            anyhow::bail!("Aggregation was cancelled");
        }
        Ok(())
    }
}

/// Drives cursor-based pagination over a [`GraphQl`] client.
#[derive(Clone)]
pub struct PaginatedFetcher {
    client: Arc<dyn GraphQl>,
    cancellation: Cancellation,
}

impl PaginatedFetcher {
    pub fn new(client: Arc<dyn GraphQl>, cancellation: Cancellation) -> Self {
        Self {
            client,
            cancellation,
        }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Fetches every page of `query` and returns all nodes in page order.
    ///
    /// A missing or null connection ends the fetch. Any failed page fails the
    /// whole fetch, nothing accumulated so far is returned.
    #[instrument(skip(self, variables))]
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        query: Query,
        page_size: u32,
        mut variables: Variables,
    ) -> anyhow::Result<Vec<T>> {
        if let Some(name) = query.page_size_variable() {
            variables.insert(name.to_string(), page_size.into());
        }

        let mut nodes = Vec::new();
        let mut pages = 0;
        loop {
            let Some(connection) = self.request(query, &variables).await? else {
                break;
            };
            let page: Connection<T> = serde_json::from_value(connection)
                .with_context(|| format!("Failed to decode {query:?} page"))?;
            pages += 1;
            nodes.extend(page.nodes.unwrap_or_default());

            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => {
                    variables.insert("afterCursor".to_string(), cursor.into());
                }
                _ => break,
            }
        }

        debug!("Fetched {} nodes in {pages} pages", nodes.len());
        Ok(nodes)
    }

    /// Fetches a single object, `None` when the server returned null for it.
    #[instrument(skip(self, variables))]
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        query: Query,
        variables: Variables,
    ) -> anyhow::Result<Option<T>> {
        self.request(query, &variables)
            .await?
            .map(|value| {
                serde_json::from_value(value)
                    .with_context(|| format!("Failed to decode {query:?} response"))
            })
            .transpose()
    }

    async fn request(&self, query: Query, variables: &Variables) -> anyhow::Result<Option<Value>> {
        self.cancellation.check()?;
        let mut data = self
            .client
            .query(query, variables)
            .await
            .with_context(|| format!("Failed to fetch {query:?}"))?;

        Ok(data
            .pointer_mut(query.pointer())
            .map(Value::take)
            .filter(|value| !value.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{api::github::variables, testing::FakeGraphQl};

    fn page(names: &[&str], cursor: &str, has_next_page: bool) -> Value {
        json!({
            "repository": {
                "refs": {
                    "nodes": names.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
                    "pageInfo": { "endCursor": cursor, "hasNextPage": has_next_page }
                }
            }
        })
    }

    fn fetcher(client: FakeGraphQl) -> (PaginatedFetcher, Arc<FakeGraphQl>) {
        let client = Arc::new(client);
        (
            PaginatedFetcher::new(client.clone(), Cancellation::default()),
            client,
        )
    }

    fn names(nodes: Vec<crate::api::github::Named>) -> Vec<String> {
        nodes.into_iter().map(|node| node.name).collect()
    }

    #[tokio::test]
    async fn concatenates_pages_in_order() {
        let (fetcher, client) = fetcher(FakeGraphQl::new(|_, variables| {
            Ok(match variables.get("afterCursor").and_then(Value::as_str) {
                None => page(&["main", "dev"], "c1", true),
                Some("c1") => page(&["feature"], "c2", true),
                Some("c2") => page(&["fix"], "c3", false),
                Some(other) => panic!("unexpected cursor {other}"),
            })
        }));

        let branches = fetcher
            .fetch_all(Query::Branches, 2, variables([("owner", json!("octo"))]))
            .await
            .unwrap();

        assert_eq!(names(branches), vec!["main", "dev", "feature", "fix"]);
        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, variables)| {
            variables["numBranches"] == json!(2) && variables["owner"] == json!("octo")
        }));
    }

    #[tokio::test]
    async fn null_page_ends_the_fetch() {
        let (fetcher, client) = fetcher(FakeGraphQl::new(|_, variables| {
            Ok(match variables.get("afterCursor") {
                None => page(&["main"], "c1", true),
                Some(_) => json!({ "repository": null }),
            })
        }));

        let branches = fetcher
            .fetch_all(Query::Branches, 10, Variables::new())
            .await
            .unwrap();

        assert_eq!(names(branches), vec!["main"]);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_cursor_ends_the_fetch() {
        let (fetcher, client) = fetcher(FakeGraphQl::new(|_, _| {
            Ok(json!({
                "repository": { "refs": { "nodes": [{ "name": "main" }], "pageInfo": { "endCursor": null, "hasNextPage": true } } }
            }))
        }));

        let branches = fetcher
            .fetch_all(Query::Branches, 10, Variables::new())
            .await
            .unwrap();

        assert_eq!(names(branches), vec!["main"]);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_page_fails_the_fetch() {
        let (fetcher, _) = fetcher(FakeGraphQl::new(|_, variables| {
            match variables.get("afterCursor") {
                None => Ok(page(&["main"], "c1", true)),
                Some(_) => anyhow::bail!("502 Bad Gateway"),
            }
        }));

        let result = fetcher
            .fetch_all::<crate::api::github::Named>(Query::Branches, 10, Variables::new())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn undecodable_page_fails_the_fetch() {
        let (fetcher, _) = fetcher(FakeGraphQl::new(|_, _| {
            Ok(json!({ "repository": { "refs": { "nodes": [{ "title": "main" }] } } }))
        }));

        let result = fetcher
            .fetch_all::<crate::api::github::Named>(Query::Branches, 10, Variables::new())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancelled_fetch_issues_no_request() {
        let (fetcher, client) = fetcher(FakeGraphQl::new(|_, _| Ok(page(&["main"], "c1", false))));
        fetcher.cancellation().cancel();

        let result = fetcher
            .fetch_all::<crate::api::github::Named>(Query::Branches, 10, Variables::new())
            .await;

        assert!(result.is_err());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn fetch_one_returns_none_for_null() {
        let (fetcher, _) = fetcher(FakeGraphQl::new(|_, _| {
            Ok(json!({ "repository": { "defaultBranchRef": null } }))
        }));

        let branch = fetcher
            .fetch_one::<crate::api::github::Named>(Query::DefaultBranch, Variables::new())
            .await
            .unwrap();

        assert!(branch.is_none());
    }
}
