use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::PriceFrame;
use core_types::numeric::{excess_kurtosis, max, mean, min, observed, sample_std, sample_variance, skewness};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name used for the whole frame when no periods are given.
pub const FULL_PERIOD: &str = "full_period";

/// Summary statistics of the observed values of one column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub variance: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let v = observed(values);
        Self {
            count: v.len(),
            mean: mean(&v),
            std: sample_std(&v),
            variance: sample_variance(&v),
            skewness: skewness(&v),
            kurtosis: excess_kurtosis(&v),
            min: min(&v),
            max: max(&v),
        }
    }
}

/// A named, inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Statistics for every column of `frame`, keyed by column name.
pub fn calculate_stats(frame: &PriceFrame) -> BTreeMap<String, ColumnStats> {
    frame
        .columns()
        .iter()
        .map(|c| (c.name.clone(), ColumnStats::from_values(&c.values)))
        .collect()
}

/// Statistics per period, or for [`FULL_PERIOD`] when `periods` is `None`.
pub fn descriptive_statistics(
    frame: &PriceFrame,
    periods: Option<&[Period]>,
) -> Result<BTreeMap<String, BTreeMap<String, ColumnStats>>, AnalyticsError> {
    if frame.is_empty() {
        return Err(AnalyticsError::EmptyInput("Price frame".to_string()));
    }

    let Some(periods) = periods else {
        return Ok(BTreeMap::from([(FULL_PERIOD.to_string(), calculate_stats(frame))]));
    };

    periods
        .iter()
        .map(|p| {
            if p.start > p.end {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "period '{}' starts after it ends",
                    p.name
                )));
            }
            let slice = frame.filter_by_date(Some(p.start), Some(p.end));
            Ok((p.name.clone(), calculate_stats(&slice)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Column;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame() -> PriceFrame {
        PriceFrame::new(
            vec![ymd(2020, 1, 1), ymd(2020, 1, 2), ymd(2020, 1, 3), ymd(2021, 1, 1), ymd(2021, 1, 2)],
            vec![Column::new("price", vec![Some(1.0), Some(2.0), None, Some(10.0), Some(20.0)])],
        )
        .unwrap()
    }

    #[test]
    fn full_period_ignores_missing_cells() {
        let stats = descriptive_statistics(&frame(), None).unwrap();
        let price = stats[FULL_PERIOD]["price"];
        assert_eq!(price.count, 4);
        assert_eq!(price.mean, Some(8.25));
        assert_eq!(price.min, Some(1.0));
        assert_eq!(price.max, Some(20.0));
        assert!(price.kurtosis.is_some());
    }

    #[test]
    fn periods_are_inclusive() {
        let periods = [
            Period { name: "2020".into(), start: ymd(2020, 1, 1), end: ymd(2020, 12, 31) },
            Period { name: "2021".into(), start: ymd(2021, 1, 1), end: ymd(2021, 1, 2) },
        ];
        let stats = descriptive_statistics(&frame(), Some(&periods)).unwrap();
        assert_eq!(stats["2020"]["price"].mean, Some(1.5));
        assert_eq!(stats["2021"]["price"].mean, Some(15.0));
        assert_eq!(stats["2021"]["price"].skewness, None);
    }

    #[test]
    fn empty_frame_is_an_error() {
        assert!(matches!(
            descriptive_statistics(&PriceFrame::default(), None),
            Err(AnalyticsError::EmptyInput(_))
        ));
    }
}
