use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

use super::count_map::CountMap;
use super::walker::{PageRequest, PageWalker};
use super::MetricError;
use crate::github::{fetch_reviews, pulls_path, Gateway, PullRequest, RepositoryRef, PER_PAGE};
use crate::timestamp::TimeWindow;

/// Review activity per login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewCounts {
    /// Reviews submitted on other people's pull requests, one per review.
    pub reviews_given: CountMap,
    /// Distinct pull requests of other people reviewed at least once.
    pub pull_requests_reviewed: CountMap,
    /// Pull requests on which the login is a pending requested reviewer.
    pub reviews_requested: CountMap,
}

impl ReviewCounts {
    pub fn merge(&mut self, other: &ReviewCounts) {
        self.reviews_given.merge(&other.reviews_given);
        self.pull_requests_reviewed.merge(&other.pull_requests_reviewed);
        self.reviews_requested.merge(&other.reviews_requested);
    }

    /// Union of logins present in any of the three maps, ascending.
    pub fn logins(&self) -> BTreeSet<&str> {
        self.reviews_given
            .logins()
            .chain(self.pull_requests_reviewed.logins())
            .chain(self.reviews_requested.logins())
            .collect()
    }
}

/// Count review activity on pull requests created within the window.
///
/// Pull requests created outside the window are skipped without fetching
/// their reviews. Reviews by the pull request's own author are not counted.
#[instrument(skip(gateway, repo, window), fields(repo = %repo))]
pub async fn count_reviews(
    gateway: &dyn Gateway,
    repo: &RepositoryRef,
    window: &TimeWindow,
) -> Result<ReviewCounts, MetricError> {
    let request = PageRequest::new(pulls_path(repo), "created").param("state", "all");
    let mut walker: PageWalker<'_, PullRequest> = PageWalker::new(gateway, request, *window);
    let mut counts = ReviewCounts::default();

    while let Some(prs) = walker.next_page().await? {
        for pr in &prs {
            let Some(created_at) = pr.created_at.as_deref() else {
                continue;
            };
            if !window.contains_timestamp(created_at)? {
                continue;
            }
            tally_pull_request(gateway, repo, pr, &mut counts).await?;
        }
    }

    info!(
        repo = %repo,
        pages = walker.pages_fetched(),
        count = counts.reviews_given.total(),
        "counted reviews"
    );
    Ok(counts)
}

async fn tally_pull_request(
    gateway: &dyn Gateway,
    repo: &RepositoryRef,
    pr: &PullRequest,
    counts: &mut ReviewCounts,
) -> Result<(), MetricError> {
    let reviews = fetch_reviews(gateway, repo, pr.number).await?;
    if reviews.len() >= PER_PAGE {
        warn!(repo = %repo, pr = pr.number, "review listing truncated to the first page");
    }

    let author = pr.author();
    let mut reviewers = BTreeSet::new();
    for reviewer in reviews.iter().filter_map(|r| r.reviewer()) {
        if reviewer == author {
            continue;
        }
        counts.reviews_given.increment(reviewer);
        reviewers.insert(reviewer);
    }
    for reviewer in reviewers {
        counts.pull_requests_reviewed.increment(reviewer);
    }
    for requested in &pr.requested_reviewers {
        counts.reviews_requested.increment(&requested.login);
    }
    Ok(())
}
