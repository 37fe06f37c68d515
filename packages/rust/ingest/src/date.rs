//! Date normalization to `YYYY-MM-DD`.
//!
//! Records carry dates in whatever format the person typing them preferred.
//! A fixed list of patterns is tried in priority order; the first that
//! parses wins. An ambiguous string such as `01/02/2024` is therefore read
//! as month/day (January 2nd) because `%m/%d/%Y` precedes `%d/%m/%Y`.
//! No locale inference is attempted.
//!
//! Each pattern is paired with a shape check so the year is always four
//! digits: chrono's `%Y` alone would read `05/01/23` as the year 23.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use lineagebook_shared::{INVALID_DATE, NO_DATE};

/// Accepted input patterns, in priority order.
pub const DATE_PATTERNS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y"];

/// Textual shape each entry of [`DATE_PATTERNS`] must match before parsing.
static DATE_SHAPES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"^\d{4}-\d{1,2}-\d{1,2}$",
        r"^\d{1,2}-\d{1,2}-\d{4}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
    ]
    .map(|shape| Regex::new(shape).expect("date shape regex"))
});

/// Canonical output pattern.
const OUTPUT_PATTERN: &str = "%Y-%m-%d";

/// Outcome of normalizing one date field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    /// Parsed successfully.
    Valid(NaiveDate),
    /// Empty or whitespace-only input.
    Missing,
    /// Non-empty input that matched no pattern. Holds the trimmed input.
    Invalid(String),
}

impl NormalizedDate {
    /// Canonical string, or the matching sentinel.
    pub fn display(&self) -> String {
        match self {
            Self::Valid(date) => date.format(OUTPUT_PATTERN).to_string(),
            Self::Missing => NO_DATE.to_string(),
            Self::Invalid(_) => INVALID_DATE.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Parse a date against [`DATE_PATTERNS`].
pub fn normalize_date(raw: &str) -> NormalizedDate {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NormalizedDate::Missing;
    }

    DATE_PATTERNS
        .iter()
        .zip(DATE_SHAPES.iter())
        .filter(|(_, shape)| shape.is_match(trimmed))
        .find_map(|(pattern, _)| NaiveDate::parse_from_str(trimmed, pattern).ok())
        .map(NormalizedDate::Valid)
        .unwrap_or_else(|| NormalizedDate::Invalid(trimmed.to_string()))
}
