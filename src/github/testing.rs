//! In-memory `Gateway` serving canned pages, used by the metric tests.

use super::{FetchError, Gateway, Params};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// A request observed by `FakeGateway`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Serves JSON keyed by `(path, page)`. Unknown keys answer with an empty array,
/// which is how GitHub reports a page past the end of a listing.
#[derive(Default)]
pub struct FakeGateway {
    pages: HashMap<(String, u32), Value>,
    failures: HashMap<String, u16>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: &str, page: u32, body: Value) -> Self {
        self.pages.insert((path.to_string(), page), body);
        self
    }

    /// Every request to `path` fails with `status`.
    pub fn with_failure(mut self, path: &str, status: u16) -> Self {
        self.failures.insert(path.to_string(), status);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch(&self, path: &str, params: &Params) -> Result<Value, FetchError> {
        let recorded = RecordedRequest {
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        let page = recorded
            .param("page")
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(1);
        self.requests.lock().unwrap().push(recorded);

        if let Some(status) = self.failures.get(path) {
            return Err(FetchError::Status {
                status: *status,
                body: "{\"message\":\"Server Error\"}".to_string(),
            });
        }

        Ok(self
            .pages
            .get(&(path.to_string(), page))
            .cloned()
            .unwrap_or_else(|| json!([])))
    }
}

/// Minimal pull request JSON as returned by the pulls listing.
pub fn pull_json(number: u64, author: &str, created_at: &str, merged_at: Option<&str>) -> Value {
    json!({
        "number": number,
        "user": { "login": author },
        "created_at": created_at,
        "merged_at": merged_at,
        "requested_reviewers": [],
    })
}

/// Minimal review JSON as returned by the reviews listing.
pub fn review_json(reviewer: &str) -> Value {
    json!({ "user": { "login": reviewer }, "state": "COMMENTED" })
}
