use crate::error::AnalyticsError;
use chrono::{Duration, NaiveDate};
use core_types::numeric::{max, mean, min, observed, sample_std};
use core_types::{AlignedEvent, Event, ImpactMetrics, PriceFrame};
use serde::Serialize;
use tracing::{info, warn};

/// Why an event kept empty impact metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingDate,
    NoPricesInWindow,
    InsufficientBeforeAfter,
    DateOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEvent {
    /// Position of the event in the input list.
    pub index: usize,
    pub event_date: Option<NaiveDate>,
    pub reason: SkipReason,
}

/// Result of aligning a list of events. `events` has one entry per input
/// event, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentOutcome {
    pub events: Vec<AlignedEvent>,
    pub skipped: Vec<SkippedEvent>,
    pub aligned_count: usize,
}

/// Measures how the price column moved around each event.
///
/// For an event on day `d` the samples in `[d - W, d)` form the "before" set,
/// those in `(d, d + W]` the "after" set, and `[d - W, d + W]` the full window.
/// Events lacking a date or a sample on either side keep empty metrics and are
/// listed in [`AlignmentOutcome::skipped`]; they are never dropped.
pub fn align_events_with_prices(
    prices: &PriceFrame,
    events: &[Event],
    window_days: i64,
    price_column: &str,
) -> Result<AlignmentOutcome, AnalyticsError> {
    if prices.is_empty() {
        return Err(AnalyticsError::EmptyInput("Price frame".to_string()));
    }
    if events.is_empty() {
        return Err(AnalyticsError::EmptyInput("Event list".to_string()));
    }
    if window_days <= 0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "window_days must be positive, got {window_days}"
        )));
    }
    let window = Duration::try_days(window_days).ok_or_else(|| {
        AnalyticsError::InvalidParameter(format!("window_days {window_days} is out of range"))
    })?;
    let values = prices
        .column(price_column)
        .ok_or_else(|| AnalyticsError::MissingColumn(price_column.to_string()))?;
    if !prices.is_strictly_ascending() {
        return Err(AnalyticsError::UnorderedIndex);
    }

    let dates = prices.dates();
    let mut outcome = AlignmentOutcome {
        events: Vec::with_capacity(events.len()),
        skipped: Vec::new(),
        aligned_count: 0,
    };

    for (index, event) in events.iter().enumerate() {
        let measured = match event.event_date {
            Some(date) => measure(dates, values, date, window),
            None => Err(SkipReason::MissingDate),
        };
        match measured {
            Ok(metrics) => {
                outcome.aligned_count += 1;
                outcome.events.push(AlignedEvent {
                    event: event.clone(),
                    metrics,
                });
            }
            Err(reason) => {
                warn!(index, event_date = ?event.event_date, ?reason, "Could not align event with prices.");
                outcome.skipped.push(SkippedEvent {
                    index,
                    event_date: event.event_date,
                    reason,
                });
                outcome.events.push(AlignedEvent::unaligned(event.clone()));
            }
        }
    }

    info!(
        "Aligned {} of {} events with price data.",
        outcome.aligned_count,
        events.len()
    );
    Ok(outcome)
}

fn measure(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    date: NaiveDate,
    window: Duration,
) -> Result<ImpactMetrics, SkipReason> {
    let start = date.checked_sub_signed(window).ok_or(SkipReason::DateOutOfRange)?;
    let end = date.checked_add_signed(window).ok_or(SkipReason::DateOutOfRange)?;

    let lo = dates.partition_point(|d| *d < start);
    let at = dates.partition_point(|d| *d < date);
    let past = dates.partition_point(|d| *d <= date);
    let hi = dates.partition_point(|d| *d <= end);

    let full = observed(&values[lo..hi]);
    if full.is_empty() {
        return Err(SkipReason::NoPricesInWindow);
    }
    let before = observed(&values[lo..at]);
    let after = observed(&values[past..hi]);
    let (Some(price_before), Some(price_after)) = (mean(&before), mean(&after)) else {
        return Err(SkipReason::InsufficientBeforeAfter);
    };

    let price_change = price_after - price_before;
    Ok(ImpactMetrics {
        price_before: Some(price_before),
        price_after: Some(price_after),
        price_change: Some(price_change),
        price_change_pct: (price_before != 0.0).then(|| price_change / price_before * 100.0),
        max_price_window: max(&full),
        min_price_window: min(&full),
        volatility_window: sample_std(&full),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Column;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate, end: NaiveDate, price: impl Fn(usize) -> Option<f64>) -> PriceFrame {
        let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
        let values = (0..dates.len()).map(price).collect();
        PriceFrame::new(dates, vec![Column::new("price", values)]).unwrap()
    }

    fn event(date: NaiveDate) -> Event {
        Event {
            event_date: Some(date),
            event_type: Some("Economic".into()),
            ..Event::default()
        }
    }

    #[test]
    fn means_match_the_exact_thirty_day_slices() {
        let start = ymd(2020, 2, 1);
        let frame = daily(start, ymd(2020, 4, 30), |i| Some(50.0 + i as f64));
        let d = ymd(2020, 3, 9);
        let outcome = align_events_with_prices(&frame, &[event(d)], 30, "price").unwrap();

        // Offsets from 2020-02-01: the event is day 37, the window starts on
        // 2020-02-08 (day 7) and ends on 2020-04-08 (day 67).
        let offset = |date: NaiveDate| (date - start).num_days() as f64;
        let before: Vec<f64> = (7..37).map(|i| 50.0 + i as f64).collect();
        let after: Vec<f64> = (38..68).map(|i| 50.0 + i as f64).collect();
        assert_eq!(offset(d), 37.0);

        let m = outcome.events[0].metrics;
        assert_eq!(m.price_before, mean(&before));
        assert_eq!(m.price_after, mean(&after));
        assert_eq!(m.max_price_window, Some(117.0));
        assert_eq!(m.min_price_window, Some(57.0));
        assert_eq!(outcome.aligned_count, 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn event_at_series_start_keeps_empty_metrics() {
        let frame = daily(ymd(2020, 2, 1), ymd(2020, 4, 30), |_| Some(10.0));
        let events = [event(ymd(2020, 2, 1)), event(ymd(2020, 3, 1))];
        let outcome = align_events_with_prices(&frame, &events, 30, "price").unwrap();

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.events[0].metrics, ImpactMetrics::default());
        assert!(outcome.events[1].is_aligned());
        assert_eq!(
            outcome.skipped,
            vec![SkippedEvent {
                index: 0,
                event_date: Some(ymd(2020, 2, 1)),
                reason: SkipReason::InsufficientBeforeAfter,
            }]
        );
    }

    #[test]
    fn undated_and_distant_events_are_skipped() {
        let frame = daily(ymd(2020, 2, 1), ymd(2020, 4, 30), |_| Some(10.0));
        let events = [Event::default(), event(ymd(2010, 1, 1))];
        let outcome = align_events_with_prices(&frame, &events, 30, "price").unwrap();

        let reasons: Vec<SkipReason> = outcome.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::MissingDate, SkipReason::NoPricesInWindow]);
        assert_eq!(outcome.aligned_count, 0);
    }

    #[test]
    fn zero_before_price_has_no_percentage() {
        let frame = daily(ymd(2020, 1, 1), ymd(2020, 1, 5), |i| Some(if i < 2 { 0.0 } else { 4.0 }));
        let outcome = align_events_with_prices(&frame, &[event(ymd(2020, 1, 3))], 2, "price").unwrap();

        let m = outcome.events[0].metrics;
        assert_eq!(m.price_before, Some(0.0));
        assert_eq!(m.price_change, Some(4.0));
        assert_eq!(m.price_change_pct, None);
    }

    #[test]
    fn gaps_do_not_count_as_samples() {
        let frame = daily(ymd(2020, 1, 1), ymd(2020, 1, 5), |i| (i != 0).then_some(1.0 + i as f64));
        let outcome = align_events_with_prices(&frame, &[event(ymd(2020, 1, 2))], 1, "price").unwrap();
        assert!(!outcome.events[0].is_aligned());
        assert_eq!(outcome.skipped[0].reason, SkipReason::InsufficientBeforeAfter);
    }

    #[test]
    fn structural_problems_fail_fast() {
        let frame = daily(ymd(2020, 1, 1), ymd(2020, 1, 10), |_| Some(1.0));
        let events = [event(ymd(2020, 1, 5))];

        assert!(matches!(
            align_events_with_prices(&PriceFrame::default(), &events, 30, "price"),
            Err(AnalyticsError::EmptyInput(_))
        ));
        assert!(matches!(
            align_events_with_prices(&frame, &[], 30, "price"),
            Err(AnalyticsError::EmptyInput(_))
        ));
        assert_eq!(
            align_events_with_prices(&frame, &events, 30, "close"),
            Err(AnalyticsError::MissingColumn("close".into()))
        );
        assert!(matches!(
            align_events_with_prices(&frame, &events, 0, "price"),
            Err(AnalyticsError::InvalidParameter(_))
        ));

        let unordered = PriceFrame::new(
            vec![ymd(2020, 1, 2), ymd(2020, 1, 1)],
            vec![Column::new("price", vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();
        assert_eq!(
            align_events_with_prices(&unordered, &events, 30, "price"),
            Err(AnalyticsError::UnorderedIndex)
        );
    }

    proptest! {
        #[test]
        fn output_matches_input_order_and_change_identity(
            offsets in proptest::collection::vec(-40i64..120, 1..20),
            window in 1i64..45,
        ) {
            let start = ymd(2020, 1, 1);
            let frame = daily(start, ymd(2020, 3, 31), |i| Some(30.0 + (i % 7) as f64));
            let events: Vec<Event> = offsets.iter().map(|o| event(start + Duration::days(*o))).collect();

            let outcome = align_events_with_prices(&frame, &events, window, "price").unwrap();
            prop_assert_eq!(outcome.events.len(), events.len());
            prop_assert_eq!(outcome.aligned_count + outcome.skipped.len(), events.len());
            for (aligned, original) in outcome.events.iter().zip(&events) {
                prop_assert_eq!(&aligned.event, original);
                if let (Some(b), Some(a), Some(c)) = (
                    aligned.metrics.price_before,
                    aligned.metrics.price_after,
                    aligned.metrics.price_change,
                ) {
                    prop_assert_eq!(c, a - b);
                }
            }
        }
    }
}
