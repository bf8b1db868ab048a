//! Date parsing shared by the file loaders and the HTTP query layer.

use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// The only date format accepted from API callers and emitted in responses.
pub const YMD_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses the date formats found in published price files (`1987-05-20`,
/// `20-May-87`, `05/20/1987`, ...). Date-times are truncated to their date.
pub fn parse_date_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Strict `YYYY-MM-DD` parsing for user supplied parameters.
pub fn parse_ymd(raw: &str, name: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), YMD_FORMAT).map_err(|_| CoreError::InvalidDate {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_price_file_formats() {
        assert_eq!(parse_date_flexible("2020-03-09"), Some(ymd(2020, 3, 9)));
        assert_eq!(parse_date_flexible("20-May-87"), Some(ymd(1987, 5, 20)));
        assert_eq!(parse_date_flexible("20-May-1987"), Some(ymd(1987, 5, 20)));
        assert_eq!(parse_date_flexible("05/20/1987"), Some(ymd(1987, 5, 20)));
        assert_eq!(parse_date_flexible("Apr 22, 2020"), Some(ymd(2020, 4, 22)));
        assert_eq!(parse_date_flexible("2020-03-09 00:00:00"), Some(ymd(2020, 3, 9)));
        assert_eq!(parse_date_flexible("2020-03-09T12:00:00+00:00"), Some(ymd(2020, 3, 9)));
    }

    #[test]
    fn rejects_garbage_and_blanks() {
        assert_eq!(parse_date_flexible(""), None);
        assert_eq!(parse_date_flexible("   "), None);
        assert_eq!(parse_date_flexible("not a date"), None);
    }

    #[test]
    fn strict_parser_only_accepts_ymd() {
        assert_eq!(parse_ymd("2021-01-31", "start_date").unwrap(), ymd(2021, 1, 31));

        let err = parse_ymd("31/01/2021", "start_date").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid start_date format '31/01/2021'. Expected YYYY-MM-DD format"
        );
        assert!(parse_ymd("2021-02-30", "end_date").is_err());
    }
}
