//! Parsing of the listing's human date text (`May 16`, `May 16, 2026`,
//! `Dec 30, 2025 - Jan 2, 2026`) into calendar dates.
//!
//! `parse` never fails: anything it cannot read becomes `(today, None)`.
//! Callers that want to know about those fallbacks use `try_parse`.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

const RANGE_SEPARATOR: &str = " - ";

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("year pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Invalid date format: {0}")]
    Format(String),

    #[error("Unknown month: {0}")]
    UnknownMonth(String),

    #[error("Invalid day: {0}")]
    InvalidDay(String),

    #[error("Date does not exist: {year}-{month}-{day}")]
    OutOfRange { year: i32, month: u32, day: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct DateRangeParser {
    today: NaiveDate,
}

impl DateRangeParser {
    /// Parser whose default year and fallback date come from `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn for_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Parse `raw`, substituting `(today, None)` for unreadable text.
    pub fn parse(&self, raw: &str) -> DateRange {
        self.parse_with_diagnostic(raw).0
    }

    /// Same result as `parse`, plus the error that caused a fallback.
    pub fn parse_with_diagnostic(&self, raw: &str) -> (DateRange, Option<DateParseError>) {
        match self.try_parse(raw) {
            Ok(range) => (range, None),
            Err(e) => {
                debug!("Falling back to today for date text '{}': {}", raw, e);
                crate::observability::metrics::dates::fallback_used();
                let fallback = DateRange {
                    start: self.today,
                    end: None,
                };
                (fallback, Some(e))
            }
        }
    }

    pub fn try_parse(&self, raw: &str) -> Result<DateRange, DateParseError> {
        let text = raw.trim();
        let current_year = self.today.year();

        if text.contains(RANGE_SEPARATOR) {
            let mut segments = text.split(RANGE_SEPARATOR);
            let first = segments.next().unwrap_or_default();
            let second = segments.next().unwrap_or_default();

            let first_year = extract_year(first);
            let second_year = extract_year(second);
            let start_year = first_year.or(second_year).unwrap_or(current_year);
            let end_year = second_year.unwrap_or(start_year);

            Ok(DateRange {
                start: parse_month_day(first, start_year)?,
                end: Some(parse_month_day(second, end_year)?),
            })
        } else {
            let year = extract_year(text).unwrap_or(current_year);
            Ok(DateRange {
                start: parse_month_day(text, year)?,
                end: None,
            })
        }
    }
}

fn extract_year(segment: &str) -> Option<i32> {
    YEAR_PATTERN
        .captures(segment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reads `Month Day[, Year]`; an explicit year token wins over `default_year`.
fn parse_month_day(segment: &str, default_year: i32) -> Result<NaiveDate, DateParseError> {
    let cleaned = segment.trim().replace(',', "");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(DateParseError::Format(segment.trim().to_string()));
    }

    let month = month_number(parts[0])
        .ok_or_else(|| DateParseError::UnknownMonth(parts[0].to_lowercase()))?;
    let day: u32 = parts[1]
        .parse()
        .map_err(|_| DateParseError::InvalidDay(parts[1].to_string()))?;
    let year = parts
        .get(2)
        .and_then(|p| p.parse::<i32>().ok())
        .unwrap_or(default_year);

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(DateParseError::OutOfRange { year, month, day })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parser() -> DateRangeParser {
        DateRangeParser::new(ymd(2025, 3, 9))
    }

    #[test]
    fn test_single_date_with_year() {
        let range = parser().parse("May 16, 2026");
        assert_eq!(range.start, ymd(2026, 5, 16));
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_single_date_defaults_to_current_year() {
        let range = parser().parse("Sept 5");
        assert_eq!(range.start, ymd(2025, 9, 5));
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_range_without_year_uses_current_year() {
        let range = parser().parse("May 16 - May 18");
        assert_eq!(range.start, ymd(2025, 5, 16));
        assert_eq!(range.end, Some(ymd(2025, 5, 18)));
        assert!(range.end.unwrap() >= range.start);
    }

    #[test]
    fn test_range_start_inherits_end_year() {
        let range = parser().parse("June 28 - July 2, 2027");
        assert_eq!(range.start, ymd(2027, 6, 28));
        assert_eq!(range.end, Some(ymd(2027, 7, 2)));
    }

    #[test]
    fn test_range_end_inherits_start_year() {
        let range = parser().parse("October 3, 2026 - October 5");
        assert_eq!(range.start, ymd(2026, 10, 3));
        assert_eq!(range.end, Some(ymd(2026, 10, 5)));
    }

    #[test]
    fn test_range_across_years() {
        let range = parser().parse("Dec 30, 2025 - Jan 2, 2026");
        assert_eq!(range.start, ymd(2025, 12, 30));
        assert_eq!(range.end, Some(ymd(2026, 1, 2)));
    }

    #[test]
    fn test_month_names_are_case_insensitive() {
        assert_eq!(parser().parse("SEPTEMBER 1").start, ymd(2025, 9, 1));
        assert_eq!(parser().parse("sep 1").start, ymd(2025, 9, 1));
        assert_eq!(parser().parse("Jan 12").start, ymd(2025, 1, 12));
    }

    #[test]
    fn test_garbage_falls_back_to_today() {
        let range = parser().parse("garbage text");
        assert_eq!(range.start, ymd(2025, 3, 9));
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_try_parse_reports_errors() {
        assert_eq!(
            parser().try_parse("Smarch 3"),
            Err(DateParseError::UnknownMonth("smarch".to_string()))
        );
        assert_eq!(
            parser().try_parse("May first"),
            Err(DateParseError::InvalidDay("first".to_string()))
        );
        assert!(matches!(
            parser().try_parse("TBD"),
            Err(DateParseError::Format(_))
        ));
        assert!(matches!(
            parser().try_parse("February 30"),
            Err(DateParseError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_bad_range_half_falls_back_entirely() {
        let range = parser().parse("May 16 - whenever");
        assert_eq!(range.start, ymd(2025, 3, 9));
        assert_eq!(range.end, None);
    }
}
