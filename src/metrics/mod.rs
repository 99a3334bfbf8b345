pub mod count_map;
pub mod merged;
pub mod repos;
pub mod reviews;
pub mod walker;

pub use count_map::CountMap;
pub use reviews::ReviewCounts;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};

use crate::github::{FetchError, Gateway, RepositoryRef};
use crate::timestamp::{TimeWindow, TimestampError};

#[derive(Debug, Error)]
pub enum MetricError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Metrics of one repository.
#[derive(Debug, Clone)]
pub struct RepositoryMetrics {
    pub repo: RepositoryRef,
    pub merged: CountMap,
    pub reviews: ReviewCounts,
}

/// Pushed repository names of one owner.
#[derive(Debug, Clone)]
pub struct OwnerRepositories {
    pub owner: String,
    pub names: Vec<String>,
}

/// List pushed repositories for every owner concurrently.
///
/// Results come back in the order of `owners`. The first failure aborts the
/// whole batch.
pub async fn list_pushed_repos_for_owners(
    gateway: &dyn Gateway,
    owners: &[String],
    window: &TimeWindow,
) -> Result<Vec<OwnerRepositories>, MetricError> {
    let tasks = owners.iter().map(|owner| {
        async move {
            let names = repos::list_pushed_repos(gateway, owner, window).await?;
            Ok::<_, MetricError>(OwnerRepositories {
                owner: owner.clone(),
                names,
            })
        }
        .instrument(info_span!("owner", owner = %owner))
    });
    try_join_all(tasks).await
}

/// Run the merged-PR and review counters for every repository concurrently.
///
/// Each repository's two walks run side by side; each walk is sequential
/// internally. Results come back in the order of `repos`, and the first
/// failure aborts the whole batch.
pub async fn collect_repository_metrics(
    gateway: &dyn Gateway,
    repos: &[RepositoryRef],
    window: &TimeWindow,
) -> Result<Vec<RepositoryMetrics>, MetricError> {
    let tasks = repos.iter().map(|repo| {
        async move {
            let (merged, reviews) = futures::try_join!(
                merged::count_merged_prs(gateway, repo, window),
                reviews::count_reviews(gateway, repo, window),
            )?;
            debug!(merged = merged.total(), reviews = reviews.reviews_given.total(), "repository done");
            Ok::<_, MetricError>(RepositoryMetrics {
                repo: repo.clone(),
                merged,
                reviews,
            })
        }
        .instrument(info_span!("repository", repo = %repo))
    });
    try_join_all(tasks).await
}

/// Merged-PR counts summed across repositories.
pub fn total_merged(metrics: &[RepositoryMetrics]) -> CountMap {
    CountMap::reduce(metrics.iter().map(|m| &m.merged))
}

/// Review counts summed across repositories.
pub fn total_reviews(metrics: &[RepositoryMetrics]) -> ReviewCounts {
    metrics.iter().fold(ReviewCounts::default(), |mut acc, m| {
        acc.merge(&m.reviews);
        acc
    })
}
