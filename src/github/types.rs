use serde::Deserialize;
use std::fmt;

/// A repository addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The `user` object embedded in GitHub responses. Only the login is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
}

/// One entry of `GET /orgs/{owner}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    /// Null for repositories that have never been pushed to.
    pub pushed_at: Option<String>,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub user: User,
    pub created_at: Option<String>,
    /// Null unless the pull request was merged.
    pub merged_at: Option<String>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
}

impl PullRequest {
    pub fn author(&self) -> &str {
        &self.user.login
    }
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    /// Null when the reviewer's account has been deleted.
    pub user: Option<User>,
}

impl Review {
    pub fn reviewer(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.login.as_str())
    }
}
