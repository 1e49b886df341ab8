use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{Branch, Clock, Commit, LanguageEdge, Repository, Viewer};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// One page of a GraphQL connection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Option<Vec<T>>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerNode {
    pub id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ViewerNode> for Viewer {
    fn from(node: ViewerNode) -> Self {
        Self {
            id: node.id,
            login: node.login,
            name: node.name.filter(|name| !name.is_empty()),
            email: node.email.filter(|email| !email.is_empty()),
            created_at: node.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageNode {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageEdgeNode {
    pub node: LanguageNode,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Languages {
    #[serde(default)]
    pub edges: Vec<LanguageEdgeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_fork: bool,
    pub primary_language: Option<Named>,
    pub owner: Owner,
    pub languages: Option<Languages>,
}

impl From<RepositoryNode> for Repository {
    fn from(node: RepositoryNode) -> Self {
        Self {
            name: node.name,
            url: node.url,
            owner: node.owner.login,
            is_fork: node.is_fork,
            is_private: node.is_private,
            primary_language: node.primary_language.map(|language| language.name),
            languages: node
                .languages
                .unwrap_or_default()
                .edges
                .into_iter()
                .map(|edge| LanguageEdge {
                    name: edge.node.name,
                    color: edge.node.color,
                    size: edge.size,
                })
                .collect(),
        }
    }
}

impl From<Named> for Branch {
    fn from(node: Named) -> Self {
        Branch::new(node.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub oid: String,
    pub committed_date: DateTime<Utc>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

impl CommitNode {
    pub fn into_commit(self, clock: &dyn Clock) -> Commit {
        Commit {
            oid: self.oid,
            committed_date: clock.to_local(self.committed_date),
            additions: self.additions,
            deletions: self.deletions,
        }
    }
}
