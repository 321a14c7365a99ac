//! Date and time normalization for flight lookups.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

/// Timestamp layouts that carry an offset, tried in order.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];

/// Timestamp layouts without an offset, tried in order.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A parsed upstream timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// An instant with a known offset.
    Zoned(DateTime<FixedOffset>),
    /// A wall-clock time without offset.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parse ISO-8601-ish input. Accepts `T` or a space between date and
    /// time, optional seconds and fractions, and `Z` or `±HH:MM` offsets.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let mut s = input.trim().replacen(' ', "T", 1);
        if s.ends_with('Z') || s.ends_with('z') {
            s.pop();
            s.push_str("+00:00");
        }

        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
            .map(Self::Zoned)
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                    .map(Self::Naive)
            })
    }

    /// Wall-clock time in the local timezone. Naive timestamps are taken as
    /// already local.
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        match self {
            Self::Zoned(dt) => dt.with_timezone(&Local).naive_local(),
            Self::Naive(dt) => *dt,
        }
    }
}

/// Render a timestamp as local `HH:MM`, or `None` if it does not parse.
#[must_use]
pub fn to_hhmm(input: &str) -> Option<String> {
    Timestamp::parse(input).map(|ts| ts.local().format("%H:%M").to_string())
}

/// Normalize a date or timestamp to `YYYY-MM-DD`.
///
/// Zoned timestamps are converted to their UTC date. Input that does not
/// parse falls back to its first ten characters.
#[must_use]
pub fn normalize_date(input: &str) -> String {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }

    match Timestamp::parse(trimmed) {
        Some(Timestamp::Zoned(dt)) => dt.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Some(Timestamp::Naive(dt)) => dt.format("%Y-%m-%d").to_string(),
        None => input.chars().take(10).collect(),
    }
}
