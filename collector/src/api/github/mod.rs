use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

mod types;
pub use types::*;

/// Scalar query variables, sent as the GraphQL `variables` object.
pub type Variables = serde_json::Map<String, Value>;

pub fn variables(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Variables {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Executes one GraphQL query and returns its `data` object.
#[async_trait]
pub trait GraphQl: Send + Sync {
    async fn query(&self, query: Query, variables: &Variables) -> anyhow::Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Viewer,
    OwnedRepositories,
    ContributedRepositories,
    Branches,
    DefaultBranch,
    Commits,
}

impl Query {
    /// JSON pointer into `data` where the query's connection (or, for
    /// single-object queries, the object) lives.
    pub const fn pointer(&self) -> &'static str {
        match self {
            Query::Viewer => "/viewer",
            Query::OwnedRepositories => "/user/repositories",
            Query::ContributedRepositories => "/user/repositoriesContributedTo",
            Query::Branches => "/repository/refs",
            Query::DefaultBranch => "/repository/defaultBranchRef",
            Query::Commits => "/repository/ref/target/history",
        }
    }

    /// Name of the variable carrying the page size, for paginated queries.
    pub const fn page_size_variable(&self) -> Option<&'static str> {
        match self {
            Query::OwnedRepositories | Query::ContributedRepositories => Some("numRepos"),
            Query::Branches => Some("numBranches"),
            Query::Commits => Some("numCommits"),
            Query::Viewer | Query::DefaultBranch => None,
        }
    }

    pub const fn text(&self) -> &'static str {
        match self {
            Query::Viewer => VIEWER,
            Query::OwnedRepositories => OWNED_REPOSITORIES,
            Query::ContributedRepositories => CONTRIBUTED_REPOSITORIES,
            Query::Branches => BRANCHES,
            Query::DefaultBranch => DEFAULT_BRANCH,
            Query::Commits => COMMITS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
}

impl GithubClient {
    pub fn new(github_token: String) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;

        Ok(Self { octocrab })
    }
}

#[async_trait]
impl GraphQl for GithubClient {
    #[instrument(skip(self, variables))]
    async fn query(&self, query: Query, variables: &Variables) -> anyhow::Result<Value> {
        let mut response: Value = self
            .octocrab
            .graphql(&json!({
                "query": query.text(),
                "variables": variables,
            }))
            .await?;

        if let Some(errors) = response.get("errors").filter(|errors| !errors.is_null()) {
            anyhow::bail!("GraphQL query {query:?} returned errors: {errors}");
        }

        response
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| anyhow::anyhow!("GraphQL query {query:?} returned no data"))
    }
}

const VIEWER: &str = r#"query {
  viewer {
    id
    login
    name
    email
    createdAt
  }
}"#;

const OWNED_REPOSITORIES: &str = r#"query ($username: String!, $numRepos: Int!, $afterCursor: String) {
  user(login: $username) {
    repositories(first: $numRepos, after: $afterCursor, orderBy: {field: CREATED_AT, direction: DESC}, affiliations: [OWNER, COLLABORATOR], isFork: false) {
      nodes {
        name
        url
        isPrivate
        isFork
        primaryLanguage {
          name
        }
        owner {
          login
        }
        languages(first: 10) {
          edges {
            node {
              name
              color
            }
            size
          }
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}"#;

const CONTRIBUTED_REPOSITORIES: &str = r#"query ($username: String!, $numRepos: Int!, $afterCursor: String) {
  user(login: $username) {
    repositoriesContributedTo(first: $numRepos, after: $afterCursor, orderBy: {field: CREATED_AT, direction: DESC}, includeUserRepositories: false) {
      nodes {
        name
        url
        isPrivate
        isFork
        primaryLanguage {
          name
        }
        owner {
          login
        }
        languages(first: 10) {
          edges {
            node {
              name
              color
            }
            size
          }
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}"#;

const BRANCHES: &str = r#"query ($owner: String!, $name: String!, $numBranches: Int!, $afterCursor: String) {
  repository(owner: $owner, name: $name) {
    refs(refPrefix: "refs/heads/", first: $numBranches, after: $afterCursor) {
      nodes {
        name
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}"#;

const DEFAULT_BRANCH: &str = r#"query ($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      name
    }
  }
}"#;

const COMMITS: &str = r#"query ($owner: String!, $name: String!, $authorId: ID!, $branch: String!, $numCommits: Int!, $afterCursor: String) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $branch) {
      target {
        ... on Commit {
          history(author: { id: $authorId }, first: $numCommits, after: $afterCursor) {
            nodes {
              oid
              committedDate
              additions
              deletions
            }
            pageInfo {
              endCursor
              hasNextPage
            }
          }
        }
      }
    }
  }
}"#;
