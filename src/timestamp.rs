use chrono::{DateTime, Local, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("Malformed timestamp: {0:?}")]
    Malformed(String),

    #[error("Window start {start} is after window end {end}")]
    InvertedWindow {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a GitHub timestamp (`YYYY-MM-DDTHH:MM:SS` followed by `Z` or a numeric
/// UTC offset) into the local zone. Fractional seconds, lowercase separators
/// and a space instead of `T` are rejected.
///
/// Window bounds are built in the local zone as well, so every comparison in the
/// metric walkers happens between instants carrying the same offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Local>, TimestampError> {
    let malformed = || TimestampError::Malformed(raw.to_string());
    if raw.get(10..11) != Some("T") {
        return Err(malformed());
    }

    let parsed = match raw.strip_suffix('Z') {
        Some(utc) => NaiveDateTime::parse_from_str(utc, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc().with_timezone(&Local)),
        None => DateTime::parse_from_str(raw, &format!("{}%z", TIMESTAMP_FORMAT))
            .map(|offset| offset.with_timezone(&Local)),
    };
    parsed.map_err(|_| malformed())
}

/// Inclusive `[start, end]` range of instants a record must fall into to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Local>,
    end: DateTime<Local>,
}

impl TimeWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Result<Self, TimestampError> {
        if start > end {
            return Err(TimestampError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, instant: DateTime<Local>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Parse `raw` and check it against the window.
    pub fn contains_timestamp(&self, raw: &str) -> Result<bool, TimestampError> {
        Ok(self.contains(parse_timestamp(raw)?))
    }
}
