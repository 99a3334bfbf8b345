use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::RepositoryRef;
use crate::timestamp::TimeWindow;

/// Command-line input rejected before any network activity.
#[derive(Debug, Error)]
pub enum InvalidArgument {
    #[error("Invalid owner: {0:?} (expected a bare owner name)")]
    Owner(String),

    #[error("Invalid repositories: {0} (expected {1})")]
    Repositories(String, &'static str),

    #[error("Invalid date: {0:?} (expected YYYY-MM-DD)")]
    Date(String),

    #[error("Start date {start} is after end date {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },

    #[error("Output must be a CSV file: {}", .0.display())]
    CsvPath(PathBuf),
}

fn has_stray_slash(value: &str) -> bool {
    value.is_empty() || value.starts_with('/') || value.ends_with('/')
}

pub fn parse_owner(value: &str) -> Result<String, InvalidArgument> {
    if has_stray_slash(value) || value.contains('/') {
        return Err(InvalidArgument::Owner(value.to_string()));
    }
    Ok(value.to_string())
}

/// Resolve repository arguments.
///
/// Without a shared owner every argument must read `owner/name`; with one,
/// every argument must be a bare `name`. All offending arguments are reported
/// together. Repeated repositories are kept once, in first-seen order.
pub fn parse_repositories(
    values: &[String],
    owner: Option<&str>,
) -> Result<Vec<RepositoryRef>, InvalidArgument> {
    let mut repos = Vec::with_capacity(values.len());
    let mut seen = HashSet::new();
    let mut invalid = Vec::new();
    for value in values {
        let parsed = match (owner, value.split_once('/')) {
            _ if has_stray_slash(value) => None,
            (Some(owner), None) => Some(RepositoryRef::new(owner, value.as_str())),
            (None, Some((owner, name))) if !name.contains('/') => Some(RepositoryRef::new(owner, name)),
            _ => None,
        };
        match parsed {
            Some(repo) => {
                if seen.insert(repo.clone()) {
                    repos.push(repo);
                }
            }
            None => invalid.push(value.as_str()),
        }
    }

    if !invalid.is_empty() {
        let expected = if owner.is_some() { "name" } else { "owner/name" };
        return Err(InvalidArgument::Repositories(invalid.join(", "), expected));
    }
    Ok(repos)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, InvalidArgument> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| InvalidArgument::Date(value.to_string()))
}

/// First instant at or after `naive` that exists in `tz`. A wall-clock time
/// skipped by a DST transition resolves to the end of the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    (0..=24 * 60)
        .map(|minutes| naive + Duration::minutes(minutes))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
}

fn day_instant<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
    min: u32,
    sec: u32,
) -> Result<DateTime<Tz>, InvalidArgument> {
    date.and_hms_opt(hour, min, sec)
        .and_then(|naive| resolve_local(tz, naive))
        .ok_or_else(|| InvalidArgument::Date(date.to_string()))
}

/// Window from the start of `start` to the last second of `end`, local time.
pub fn date_window(start: NaiveDate, end: NaiveDate) -> Result<TimeWindow, InvalidArgument> {
    if start > end {
        return Err(InvalidArgument::InvertedWindow { start, end });
    }
    let from = day_instant(&Local, start, 0, 0, 0)?;
    let to = day_instant(&Local, end, 23, 59, 59)?;
    TimeWindow::new(from, to).map_err(|_| InvalidArgument::InvertedWindow { start, end })
}

pub fn validate_csv_path(path: &Path) -> Result<(), InvalidArgument> {
    match path.extension() {
        Some(ext) if ext == "csv" => Ok(()),
        _ => Err(InvalidArgument::CsvPath(path.to_path_buf())),
    }
}
