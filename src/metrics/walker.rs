use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

use super::MetricError;
use crate::github::{decode, Gateway, Params, PullRequest, PER_PAGE};
use crate::timestamp::{parse_timestamp, TimeWindow};

/// An item of a listing sorted by a timestamp field, newest first.
pub trait Paged: DeserializeOwned {
    /// Raw value of the sort field; `None` when the record lacks it.
    fn ordering_timestamp(&self) -> Option<&str>;
}

impl Paged for PullRequest {
    fn ordering_timestamp(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// Endpoint and fixed query parameters of a paginated listing.
#[derive(Debug, Clone)]
pub struct PageRequest {
    path: String,
    params: Params,
}

impl PageRequest {
    /// `sort` names the timestamp field the listing is ordered by.
    pub fn new(path: impl Into<String>, sort: &'static str) -> Self {
        Self {
            path: path.into(),
            params: vec![("sort", sort.to_string()), ("direction", "desc".to_string())],
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    fn page_params(&self, page: u32) -> Params {
        let mut params = self.params.clone();
        params.push(("per_page", PER_PAGE.to_string()));
        params.push(("page", page.to_string()));
        params
    }
}

/// Where the walk stands relative to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frontier {
    /// Sort timestamp of the last item seen (initially the window end).
    At(DateTime<Local>),
    /// The last item seen had no sort timestamp.
    Unknown,
    /// An empty page came back.
    Exhausted,
}

/// Walks a descending, page-numbered listing backwards in time.
///
/// Pages are requested strictly in order. The walk ends when a page comes back
/// empty, or before requesting the next page once the trailing item of the
/// previous page is older than the window start (or has no timestamp). Items
/// are returned unfiltered: callers check each one against the window since a
/// page ordered by one field may hold items in-window by another.
pub struct PageWalker<'a, T> {
    gateway: &'a dyn Gateway,
    request: PageRequest,
    window: TimeWindow,
    page: u32,
    frontier: Frontier,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: Paged> PageWalker<'a, T> {
    pub fn new(gateway: &'a dyn Gateway, request: PageRequest, window: TimeWindow) -> Self {
        Self {
            gateway,
            request,
            window,
            page: 1,
            frontier: Frontier::At(window.end()),
            _item: PhantomData,
        }
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> u32 {
        self.page - 1
    }

    fn can_continue(&self) -> bool {
        match self.frontier {
            Frontier::At(timestamp) => timestamp >= self.window.start(),
            Frontier::Unknown | Frontier::Exhausted => false,
        }
    }

    /// Fetch the next page, or `None` once the walk is over.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, MetricError> {
        if !self.can_continue() {
            return Ok(None);
        }

        let params = self.request.page_params(self.page);
        let value = self.gateway.fetch(&self.request.path, &params).await?;
        self.page += 1;

        let items: Vec<T> = decode(&self.request.path, value)?;
        self.frontier = match items.last() {
            None => Frontier::Exhausted,
            Some(last) => match last.ordering_timestamp() {
                Some(raw) => Frontier::At(parse_timestamp(raw)?),
                None => Frontier::Unknown,
            },
        };
        debug!(
            path = %self.request.path,
            page = self.page - 1,
            items = items.len(),
            frontier = ?self.frontier,
            "fetched page"
        );

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{pull_json, FakeGateway};
    use serde_json::json;

    const PULLS: &str = "/repos/acme/svc-a/pulls";

    fn window() -> TimeWindow {
        TimeWindow::new(
            parse_timestamp("2023-01-01T00:00:00Z").unwrap(),
            parse_timestamp("2023-03-31T23:59:59Z").unwrap(),
        )
        .unwrap()
    }

    async fn drain(walker: &mut PageWalker<'_, PullRequest>) -> Vec<Vec<u64>> {
        let mut pages = Vec::new();
        while let Some(items) = walker.next_page().await.unwrap() {
            pages.push(items.iter().map(|pr| pr.number).collect());
        }
        pages
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let gateway = FakeGateway::new()
            .with_page(PULLS, 1, json!([pull_json(1, "a", "2023-03-01T00:00:00Z", None)]))
            .with_page(PULLS, 2, json!([pull_json(2, "a", "2023-02-01T00:00:00Z", None)]));
        let mut walker = PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        let pages = drain(&mut walker).await;

        assert_eq!(pages, vec![vec![1], vec![2]]);
        assert_eq!(gateway.requests().len(), 3);
        assert_eq!(walker.pages_fetched(), 3);
        assert_eq!(gateway.requests()[2].param("page"), Some("3"));
    }

    #[tokio::test]
    async fn test_stops_after_frontier_crosses_start() {
        let gateway = FakeGateway::new()
            .with_page(PULLS, 1, json!([pull_json(1, "a", "2023-03-01T00:00:00Z", None)]))
            .with_page(
                PULLS,
                2,
                json!([
                    pull_json(2, "a", "2023-01-05T00:00:00Z", None),
                    pull_json(3, "a", "2022-12-20T00:00:00Z", None)
                ]),
            )
            .with_page(PULLS, 3, json!([pull_json(4, "a", "2022-11-01T00:00:00Z", None)]));
        let mut walker = PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        let pages = drain(&mut walker).await;

        assert_eq!(pages, vec![vec![1], vec![2, 3]]);
        assert_eq!(gateway.requests().len(), 2);
        assert!(gateway.requests().iter().all(|r| r.param("page") != Some("3")));
    }

    #[tokio::test]
    async fn test_frontier_equal_to_start_continues() {
        let gateway = FakeGateway::new()
            .with_page(PULLS, 1, json!([pull_json(1, "a", "2023-01-01T00:00:00Z", None)]));
        let mut walker = PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        drain(&mut walker).await;

        assert_eq!(gateway.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_null_trailing_timestamp_ends_after_page() {
        let gateway = FakeGateway::new()
            .with_page(
                PULLS,
                1,
                json!([
                    pull_json(1, "a", "2023-03-01T00:00:00Z", None),
                    { "number": 2, "user": { "login": "a" }, "created_at": null }
                ]),
            )
            .with_page(PULLS, 2, json!([pull_json(3, "a", "2023-02-01T00:00:00Z", None)]));
        let mut walker = PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        let pages = drain(&mut walker).await;

        assert_eq!(pages, vec![vec![1, 2]]);
        assert_eq!(gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_trailing_timestamp_is_an_error() {
        let gateway = FakeGateway::new()
            .with_page(PULLS, 1, json!([pull_json(1, "a", "03/01/2023", None)]));
        let mut walker: PageWalker<'_, PullRequest> =
            PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        let err = walker.next_page().await.unwrap_err();
        assert!(matches!(err, MetricError::Timestamp(_)));
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let gateway = FakeGateway::new();
        let request = PageRequest::new(PULLS, "created").param("state", "closed");
        let mut walker: PageWalker<'_, PullRequest> = PageWalker::new(&gateway, request, window());

        assert!(walker.next_page().await.unwrap().is_none());

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, PULLS);
        assert_eq!(requests[0].param("state"), Some("closed"));
        assert_eq!(requests[0].param("sort"), Some("created"));
        assert_eq!(requests[0].param("direction"), Some("desc"));
        assert_eq!(requests[0].param("per_page"), Some("100"));
        assert_eq!(requests[0].param("page"), Some("1"));
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_walk() {
        let gateway = FakeGateway::new().with_failure(PULLS, 500);
        let mut walker: PageWalker<'_, PullRequest> =
            PageWalker::new(&gateway, PageRequest::new(PULLS, "created"), window());

        let err = walker.next_page().await.unwrap_err();
        assert!(matches!(err, MetricError::Fetch(_)));
    }
}
