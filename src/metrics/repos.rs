use tracing::{debug, instrument, warn};

use super::MetricError;
use crate::github::{fetch_org_repos, Gateway, PER_PAGE};
use crate::timestamp::TimeWindow;

/// Names of an owner's repositories last pushed within the window.
///
/// Only the first page of the owner's repositories (the `PER_PAGE` most
/// recently pushed) is considered.
#[instrument(skip(gateway, window))]
pub async fn list_pushed_repos(
    gateway: &dyn Gateway,
    owner: &str,
    window: &TimeWindow,
) -> Result<Vec<String>, MetricError> {
    let repos = fetch_org_repos(gateway, owner).await?;
    if repos.len() >= PER_PAGE {
        warn!(owner, "repository listing truncated to the first page");
    }

    let mut names = Vec::new();
    for repo in repos {
        let Some(pushed_at) = repo.pushed_at.as_deref() else {
            continue;
        };
        if window.contains_timestamp(pushed_at)? {
            names.push(repo.name);
        }
    }
    debug!(owner, count = names.len(), "listed pushed repositories");
    Ok(names)
}
