use crate::error::ValidationError;
use chrono::NaiveDate;
use core_types::PriceFrame;
use core_types::numeric::{observed, quantile};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Count of IQR outliers in one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub count: usize,
    /// Share of all rows, in percent.
    pub percentage: f64,
}

/// Data quality summary of a price frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total_observations: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub missing_values: BTreeMap<String, usize>,
    pub missing_percentage: BTreeMap<String, f64>,
    pub duplicate_dates: usize,
    pub outliers: BTreeMap<String, OutlierSummary>,
}

/// Builds a [`ValidationReport`] for a non-empty frame.
///
/// Outliers are cells outside `[Q1 - 1.5 * IQR, Q3 + 1.5 * IQR]`. A column
/// with zero spread reports no outliers.
pub fn validate_data(frame: &PriceFrame) -> Result<ValidationReport, ValidationError> {
    validate_not_empty(frame, "Price frame")?;

    let total = frame.len();
    let percent = |count: usize| count as f64 / total as f64 * 100.0;

    let mut missing_values = BTreeMap::new();
    let mut missing_percentage = BTreeMap::new();
    let mut outliers = BTreeMap::new();

    for column in frame.columns() {
        let missing = column.missing_count();
        missing_values.insert(column.name.clone(), missing);
        missing_percentage.insert(column.name.clone(), percent(missing));

        let count = count_iqr_outliers(&observed(&column.values), &column.name);
        outliers.insert(
            column.name.clone(),
            OutlierSummary {
                count,
                percentage: percent(count),
            },
        );
    }

    let date_range = frame.first_date().zip(frame.last_date());
    let report = ValidationReport {
        total_observations: total,
        date_range,
        missing_values,
        missing_percentage,
        duplicate_dates: frame.duplicate_date_count(),
        outliers,
    };

    info!(
        observations = report.total_observations,
        duplicates = report.duplicate_dates,
        "Validated price data."
    );
    Ok(report)
}

/// Fails with the full list of `required` columns absent from `frame`.
pub fn validate_required_columns(frame: &PriceFrame, required: &[&str]) -> Result<(), ValidationError> {
    validate_not_empty(frame, "Price frame")?;
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !frame.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns(missing))
    }
}

fn validate_not_empty(frame: &PriceFrame, name: &str) -> Result<(), ValidationError> {
    if frame.is_empty() {
        return Err(ValidationError::Empty(name.to_string()));
    }
    Ok(())
}

fn count_iqr_outliers(values: &[f64], column: &str) -> usize {
    let (Some(q1), Some(q3)) = (quantile(values, 0.25), quantile(values, 0.75)) else {
        return 0;
    };
    let iqr = q3 - q1;
    if iqr == 0.0 {
        warn!(column, "Zero interquartile range, skipping outlier detection.");
        return 0;
    }
    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    values.iter().filter(|v| **v < lower || **v > upper).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_types::Column;

    fn frame(values: Vec<Option<f64>>) -> PriceFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len() as i64).map(|i| start + Duration::days(i)).collect();
        PriceFrame::new(dates, vec![Column::new("price", values)]).unwrap()
    }

    #[test]
    fn reports_missing_values_and_outliers() {
        let mut values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64)).collect();
        values.push(Some(100.0));
        values.push(None);
        values.push(None);
        let report = validate_data(&frame(values)).unwrap();

        assert_eq!(report.total_observations, 12);
        assert_eq!(report.missing_values["price"], 2);
        assert!((report.missing_percentage["price"] - 100.0 * 2.0 / 12.0).abs() < 1e-9);
        assert_eq!(report.outliers["price"].count, 1);
        assert_eq!(report.duplicate_dates, 0);
        let (first, last) = report.date_range.unwrap();
        assert_eq!((last - first).num_days(), 11);
    }

    #[test]
    fn flat_column_has_no_outliers() {
        let report = validate_data(&frame(vec![Some(5.0); 6])).unwrap();
        assert_eq!(report.outliers["price"].count, 0);
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_eq!(
            validate_data(&PriceFrame::default()).unwrap_err(),
            ValidationError::Empty("Price frame".into())
        );
    }

    #[test]
    fn lists_every_missing_required_column() {
        let f = frame(vec![Some(1.0)]);
        assert!(validate_required_columns(&f, &["price"]).is_ok());
        assert_eq!(
            validate_required_columns(&f, &["price", "volume", "open"]).unwrap_err(),
            ValidationError::MissingColumns(vec!["volume".into(), "open".into()])
        );
    }
}
