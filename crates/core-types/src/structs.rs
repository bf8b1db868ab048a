use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named numeric column of a [`PriceFrame`]. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// A date-indexed table of numeric columns.
///
/// Every column has exactly one cell per index date. The loader produces
/// frames whose index is strictly ascending; [`PriceFrame::is_strictly_ascending`]
/// lets consumers verify that before relying on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl PriceFrame {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self, CoreError> {
        for column in &columns {
            if column.values.len() != dates.len() {
                return Err(CoreError::LengthMismatch {
                    column: column.name.clone(),
                    expected: dates.len(),
                    actual: column.values.len(),
                });
            }
        }
        Ok(Self { dates, columns })
    }

    /// Builds a single-column frame from fully observed samples.
    pub fn from_samples(name: &str, samples: &[PriceSample]) -> Self {
        Self {
            dates: samples.iter().map(|s| s.date).collect(),
            columns: vec![Column::new(name, samples.iter().map(|s| Some(s.price)).collect())],
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// True when every date is strictly greater than its predecessor, which
    /// also rules out duplicates.
    pub fn is_strictly_ascending(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] < w[1])
    }

    pub fn duplicate_date_count(&self) -> usize {
        let mut sorted = self.dates.clone();
        sorted.sort_unstable();
        sorted.windows(2).filter(|w| w[0] == w[1]).count()
    }

    /// Returns a copy restricted to `start <= date <= end`. Either bound may be open.
    pub fn filter_by_date(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceFrame {
        self.retain_rows(|date, _| {
            start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
        })
    }

    /// Returns a copy holding only the rows for which `keep(date, row_index)` is true.
    pub fn retain_rows<F>(&self, mut keep: F) -> PriceFrame
    where
        F: FnMut(NaiveDate, usize) -> bool,
    {
        let kept: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|&(i, d)| keep(*d, i))
            .map(|(i, _)| i)
            .collect();

        PriceFrame {
            dates: kept.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), kept.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }

    /// Replaces the cells of every column, keeping the index.
    pub fn map_columns<F>(&self, mut f: F) -> PriceFrame
    where
        F: FnMut(&[NaiveDate], &[Option<f64>]) -> Vec<Option<f64>>,
    {
        PriceFrame {
            dates: self.dates.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), f(&self.dates, &c.values)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub date: NaiveDate,
    pub price: f64,
}

/// A market event as read from the events file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// `None` when the source cell was blank or not a date.
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub impact_type: Option<String>,
    pub severity: Option<String>,
    #[serde(alias = "event_description")]
    pub description: Option<String>,
    /// Any further descriptive columns of the source file.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Price movement around an event. All fields are `None` for events that
/// could not be aligned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ImpactMetrics {
    pub price_before: Option<f64>,
    pub price_after: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub max_price_window: Option<f64>,
    pub min_price_window: Option<f64>,
    pub volatility_window: Option<f64>,
}

/// An [`Event`] together with the impact metrics derived for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedEvent {
    #[serde(flatten)]
    pub event: Event,
    #[serde(flatten)]
    pub metrics: ImpactMetrics,
}

impl AlignedEvent {
    pub fn unaligned(event: Event) -> Self {
        Self {
            event,
            metrics: ImpactMetrics::default(),
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.metrics.price_before.is_some() && self.metrics.price_after.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn frame(n: i64) -> PriceFrame {
        let dates = (0..n).map(day).collect();
        let values = (0..n).map(|i| Some(i as f64)).collect();
        PriceFrame::new(dates, vec![Column::new("price", values)]).unwrap()
    }

    #[test]
    fn rejects_columns_with_wrong_length() {
        let err = PriceFrame::new(vec![day(0), day(1)], vec![Column::new("price", vec![Some(1.0)])])
            .unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn filter_is_inclusive_on_both_ends() {
        let filtered = frame(10).filter_by_date(Some(day(2)), Some(day(5)));
        assert_eq!(filtered.dates(), &[day(2), day(3), day(4), day(5)]);
        assert_eq!(filtered.column("price").unwrap()[0], Some(2.0));
    }

    #[test]
    fn detects_unordered_and_duplicate_index() {
        let f = PriceFrame::new(vec![day(1), day(0), day(1)], vec![]).unwrap();
        assert!(!f.is_strictly_ascending());
        assert_eq!(f.duplicate_date_count(), 1);
        assert!(frame(3).is_strictly_ascending());
    }

    #[test]
    fn aligned_event_serializes_flat_with_nulls() {
        let event = Event {
            event_date: Some(day(0)),
            event_type: Some("OPEC".into()),
            extra: BTreeMap::from([("source".to_string(), "Reuters".to_string())]),
            ..Event::default()
        };
        let json = serde_json::to_value(AlignedEvent::unaligned(event)).unwrap();
        assert_eq!(json["event_date"], "2020-01-01");
        assert_eq!(json["event_type"], "OPEC");
        assert_eq!(json["source"], "Reuters");
        assert!(json["price_change_pct"].is_null());
        assert!(json["volatility_window"].is_null());
    }

    proptest! {
        #[test]
        fn date_filter_is_idempotent(n in 0i64..60, a in 0i64..60, b in 0i64..60) {
            let f = frame(n);
            let (start, end) = (Some(day(a.min(b))), Some(day(a.max(b))));
            let once = f.filter_by_date(start, end);
            let twice = once.filter_by_date(start, end);
            prop_assert_eq!(once, twice);
        }
    }
}
