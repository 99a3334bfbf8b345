/// Per-user merged pull request counts across repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    /// Column headers (`owner/name`), ascending.
    pub repos: Vec<String>,
    /// One row per user, ascending by login.
    pub rows: Vec<MergedRow>,
    /// Column sums, aligned with `repos`.
    pub repo_totals: Vec<u64>,
    pub grand_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub login: String,
    /// Counts aligned with `MergedTable::repos`, 0 where absent.
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Review activity of one user summed across repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub login: String,
    pub reviews_given: u64,
    pub pull_requests_reviewed: u64,
    pub reviews_requested: u64,
}

/// Complete report of a `pr` run.
#[derive(Debug)]
pub struct Report {
    pub merged: MergedTable,
    pub reviews: Vec<ReviewRow>,
}
