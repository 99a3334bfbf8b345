pub mod types;

pub use types::{MergedRow, MergedTable, Report, ReviewRow};

use crate::metrics::{total_merged, total_reviews, OwnerRepositories, RepositoryMetrics};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write CSV file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build the merged-PR table and review rows from per-repository metrics.
pub fn build(metrics: &[RepositoryMetrics]) -> Report {
    let mut columns: Vec<&RepositoryMetrics> = metrics.iter().collect();
    columns.sort_by(|a, b| a.repo.cmp(&b.repo));

    let reduced = total_merged(metrics);
    let rows: Vec<MergedRow> = reduced
        .iter()
        .map(|(login, total)| MergedRow {
            login: login.to_string(),
            counts: columns.iter().map(|m| m.merged.get(login)).collect(),
            total,
        })
        .collect();

    let merged = MergedTable {
        repos: columns.iter().map(|m| m.repo.to_string()).collect(),
        repo_totals: columns.iter().map(|m| m.merged.total()).collect(),
        grand_total: reduced.total(),
        rows,
    };

    let review_counts = total_reviews(metrics);
    let reviews = review_counts
        .logins()
        .into_iter()
        .map(|login| ReviewRow {
            login: login.to_string(),
            reviews_given: review_counts.reviews_given.get(login),
            pull_requests_reviewed: review_counts.pull_requests_reviewed.get(login),
            reviews_requested: review_counts.reviews_requested.get(login),
        })
        .collect();

    Report { merged, reviews }
}

/// Print the report to the terminal, and export the merged-PR table when a
/// CSV path is given.
#[instrument(skip(report), fields(users = report.merged.rows.len()))]
pub fn output(report: &Report, csv_path: Option<&Path>) -> Result<(), ReportError> {
    debug!("writing report to terminal");
    print_merged_table(&report.merged);
    print_review_table(&report.reviews);

    if let Some(path) = csv_path {
        debug!(path = %path.display(), "writing merged table to CSV");
        write_csv(&report.merged, path)?;
    }
    Ok(())
}

/// Print each owner's pushed repositories.
pub fn print_pushed_repos(listed: &[OwnerRepositories]) {
    for entry in listed {
        println!("{} ({})", entry.owner.bold(), entry.names.len());
        if entry.names.is_empty() {
            println!("  No repositories pushed in this period.");
        }
        for name in &entry.names {
            println!("  • {}", name);
        }
    }
}

fn print_merged_table(table: &MergedTable) {
    let width = table
        .rows
        .iter()
        .map(|r| r.login.len())
        .chain(std::iter::once("Total".len()))
        .max()
        .unwrap_or(0);

    println!();
    println!("═══ {} ═══", "Merged Pull Requests".bold());
    if table.rows.is_empty() {
        println!("  No merged pull requests.");
        println!();
        return;
    }

    let header: Vec<String> = table.repos.iter().map(|r| format!("{:>8}", r)).collect();
    println!("{:<width$} {} {:>8}", "User", header.join(" "), "Total", width = width);
    for row in &table.rows {
        let counts: Vec<String> = row
            .counts
            .iter()
            .zip(&table.repos)
            .map(|(count, repo)| format!("{:>w$}", count, w = repo.len().max(8)))
            .collect();
        println!("{:<width$} {} {:>8}", row.login, counts.join(" "), row.total, width = width);
    }
    let totals: Vec<String> = table
        .repo_totals
        .iter()
        .zip(&table.repos)
        .map(|(count, repo)| format!("{:>w$}", count, w = repo.len().max(8)))
        .collect();
    println!(
        "{} {} {}",
        format!("{:<width$}", "Total", width = width).green().bold(),
        totals.join(" ").green().bold(),
        format!("{:>8}", table.grand_total).green().bold()
    );
    println!();
}

fn print_review_table(rows: &[ReviewRow]) {
    let width = rows.iter().map(|r| r.login.len()).max().unwrap_or(0).max("User".len());

    println!("═══ {} ═══", "Reviews".bold());
    if rows.is_empty() {
        println!("  No review activity.");
        println!();
        return;
    }

    println!("{:<width$} {:>8} {:>8} {:>10}", "User", "Reviews", "PRs", "Requested", width = width);
    for row in rows {
        println!(
            "{:<width$} {:>8} {:>8} {:>10}",
            row.login,
            row.reviews_given,
            row.pull_requests_reviewed,
            row.reviews_requested,
            width = width
        );
    }
    println!();
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: impl IntoIterator<Item = String>) -> String {
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(&f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Render the merged table as CSV: `User,<repos...>,Total`, one row per user,
/// then a `Total` row of column sums and the grand total.
fn render_csv(table: &MergedTable) -> String {
    let mut csv = csv_line(
        std::iter::once("User".to_string())
            .chain(table.repos.iter().cloned())
            .chain(std::iter::once("Total".to_string())),
    );
    for row in &table.rows {
        csv.push_str(&csv_line(
            std::iter::once(row.login.clone())
                .chain(row.counts.iter().map(u64::to_string))
                .chain(std::iter::once(row.total.to_string())),
        ));
    }
    csv.push_str(&csv_line(
        std::iter::once("Total".to_string())
            .chain(table.repo_totals.iter().map(u64::to_string))
            .chain(std::iter::once(table.grand_total.to_string())),
    ));
    csv
}

fn write_csv(table: &MergedTable, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_csv(table))?;
    Ok(())
}
