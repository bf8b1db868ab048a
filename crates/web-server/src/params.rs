//! Query string parameters and their validation.
//!
//! Every parameter arrives as an optional string so that malformed values
//! produce our own `ValidationError` envelope instead of a framework rejection.
//! Empty strings count as absent.

use crate::error::AppError;
use chrono::NaiveDate;
use core_types::dates::parse_ymd;
use serde::Deserialize;
use std::collections::BTreeSet;

/// An inclusive date range with optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    pub fn parse(&self) -> Result<DateRange, AppError> {
        parse_date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_type: Option<String>,
    pub impact_type: Option<String>,
    pub severity: Option<String>,
}

impl EventQuery {
    pub fn date_range(&self) -> Result<DateRange, AppError> {
        parse_date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub window: Option<String>,
}

impl AnalysisQuery {
    pub fn date_range(&self) -> Result<DateRange, AppError> {
        parse_date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }

    /// The requested window, or `default` when absent.
    pub fn window(&self, default: i64) -> Result<i64, AppError> {
        let Some(raw) = present(self.window.as_deref()) else {
            return Ok(default);
        };
        match raw.trim().parse::<i64>() {
            Ok(window) if window > 0 => Ok(window),
            _ => Err(AppError::Validation(format!(
                "window must be a positive integer, got '{raw}'"
            ))),
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

pub fn parse_date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, AppError> {
    let parse = |raw: Option<&str>, name: &str| {
        present(raw)
            .map(|s| parse_ymd(s, name))
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))
    };
    let range = DateRange {
        start: parse(start, "start_date")?,
        end: parse(end, "end_date")?,
    };
    if let (Some(s), Some(e)) = (range.start, range.end) {
        if s > e {
            return Err(AppError::Validation(format!(
                "start_date ({s}) must be less than or equal to end_date ({e})"
            )));
        }
    }
    Ok(range)
}

/// Accepts an absent filter, or one of `allowed`. The error lists the
/// allowed values in sorted order.
pub fn validate_filter_value<'a>(
    value: Option<&'a str>,
    allowed: &BTreeSet<&str>,
    name: &str,
) -> Result<Option<&'a str>, AppError> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    if allowed.contains(value) {
        return Ok(Some(value));
    }
    let allowed: Vec<&str> = allowed.iter().copied().collect();
    Err(AppError::Validation(format!(
        "Invalid {name} '{value}'. Allowed values: {}",
        allowed.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_strings_are_absent() {
        let range = parse_date_range(Some(""), Some("  ")).unwrap();
        assert!(range.is_unbounded());
    }

    #[test]
    fn dates_must_be_strict_and_ordered() {
        let range = parse_date_range(Some("2020-01-01"), Some("2020-12-31")).unwrap();
        assert_eq!(range.start, Some(ymd(2020, 1, 1)));
        assert!(range.contains(ymd(2020, 12, 31)));
        assert!(!range.contains(ymd(2021, 1, 1)));

        let err = parse_date_range(Some("01/02/2020"), None).unwrap_err();
        assert!(err.to_string().contains("Invalid start_date format '01/02/2020'"));

        let err = parse_date_range(Some("2021-01-01"), Some("2020-01-01")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn filter_values_list_allowed_options() {
        let allowed = BTreeSet::from(["OPEC", "Economic"]);
        assert_eq!(validate_filter_value(Some("OPEC"), &allowed, "event_type").unwrap(), Some("OPEC"));
        assert_eq!(validate_filter_value(None, &allowed, "event_type").unwrap(), None);

        let err = validate_filter_value(Some("Nonexistent"), &allowed, "event_type").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid event_type 'Nonexistent'. Allowed values: Economic, OPEC"
        );
    }

    #[test]
    fn window_defaults_and_rejects_non_positive() {
        let query = AnalysisQuery::default();
        assert_eq!(query.window(30).unwrap(), 30);

        let query = AnalysisQuery { window: Some("-3".into()), ..AnalysisQuery::default() };
        assert!(query.window(30).is_err());
    }
}
