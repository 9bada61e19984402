use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DateParseError;

// Exactly two digits, slash, two digits, slash, four digits, nothing else.
static STRICT_DMY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("strict date pattern is valid")
});

/// Fallback formats tried in order when the strict pattern does not match.
/// Formats carrying a time component are parsed as datetimes and truncated
/// to their date part.
const DEFAULT_FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parses heterogeneous date strings into a canonical calendar date.
///
/// Strings matching `DD/MM/YYYY` exactly take a deterministic day-first
/// path; everything else runs through an explicit ordered format list, so
/// the accepted inputs stay enumerable instead of "whatever a heuristic
/// guesser accepts".
pub struct DateNormalizer {
    formats: Vec<&'static str>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            formats: DEFAULT_FALLBACK_FORMATS.to_vec(),
        }
    }
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback format list. The strict `DD/MM/YYYY` fast path
    /// is unaffected.
    pub fn with_formats(formats: Vec<&'static str>) -> Self {
        Self { formats }
    }

    pub fn normalize(&self, raw: &str) -> Result<NaiveDate, DateParseError> {
        let value = raw.trim();

        if STRICT_DMY.is_match(value) {
            // The strict path never falls through: an impossible calendar
            // date in this shape is an input defect, not an ambiguity.
            return NaiveDate::parse_from_str(value, "%d/%m/%Y").map_err(|_| DateParseError {
                value: raw.to_string(),
            });
        }

        for format in &self.formats {
            if format.contains("%H") {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                    return Ok(datetime.date());
                }
            } else if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Ok(date);
            }
        }

        Err(DateParseError {
            value: raw.to_string(),
        })
    }
}
