use tracing::{debug, info, instrument};

use super::count_map::CountMap;
use super::walker::{PageRequest, PageWalker};
use super::MetricError;
use crate::github::{pulls_path, Gateway, PullRequest, RepositoryRef};
use crate::timestamp::TimeWindow;

/// Count merged pull requests per author in one repository.
///
/// Walks closed pull requests newest-created first and counts those whose
/// `merged_at` lies in the window. The walk stops on `created_at`, so a PR
/// merged long after it was opened is still reached as long as it was created
/// before the window ended.
#[instrument(skip(gateway, repo, window), fields(repo = %repo))]
pub async fn count_merged_prs(
    gateway: &dyn Gateway,
    repo: &RepositoryRef,
    window: &TimeWindow,
) -> Result<CountMap, MetricError> {
    let request = PageRequest::new(pulls_path(repo), "created").param("state", "closed");
    let mut walker: PageWalker<'_, PullRequest> = PageWalker::new(gateway, request, *window);
    let mut counts = CountMap::new();

    while let Some(prs) = walker.next_page().await? {
        for pr in &prs {
            let Some(merged_at) = pr.merged_at.as_deref() else {
                continue;
            };
            if window.contains_timestamp(merged_at)? {
                counts.increment(pr.author());
            }
        }
    }

    if counts.is_empty() {
        debug!(repo = %repo, "no merged pull requests in window");
    }
    info!(
        repo = %repo,
        pages = walker.pages_fetched(),
        count = counts.total(),
        authors = counts.len(),
        "counted merged pull requests"
    );
    Ok(counts)
}
