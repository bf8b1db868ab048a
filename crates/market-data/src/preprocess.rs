use crate::error::ValidationError;
use chrono::NaiveDate;
use core_types::{FillPolicy, PriceFrame};
use tracing::info;

/// Returns a copy of `frame` with missing cells handled according to `policy`.
///
/// Fails when the input is empty or when nothing is left afterwards (only
/// possible with [`FillPolicy::Drop`]).
pub fn preprocess_data(frame: &PriceFrame, policy: FillPolicy) -> Result<PriceFrame, ValidationError> {
    if frame.is_empty() {
        return Err(ValidationError::Empty("Input frame".to_string()));
    }

    let processed = match policy {
        FillPolicy::ForwardFill => frame.map_columns(|_, values| forward_fill(values)),
        FillPolicy::BackwardFill => frame.map_columns(|_, values| backward_fill(values)),
        FillPolicy::Interpolate => frame.map_columns(interpolate_time),
        FillPolicy::Drop => frame.retain_rows(|_, row| {
            frame.columns().iter().all(|c| c.values[row].is_some())
        }),
    };

    if processed.is_empty() {
        return Err(ValidationError::EmptyAfterPreprocessing(policy.to_string()));
    }

    info!(%policy, observations = processed.len(), "Preprocessed price data.");
    Ok(processed)
}

fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

fn backward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut reversed = values.to_vec();
    reversed.reverse();
    let mut filled = forward_fill(&reversed);
    filled.reverse();
    filled
}

/// Linear interpolation where the weights are the day distances to the
/// neighbouring observations. Trailing gaps carry the last observation;
/// leading gaps have nothing to interpolate from and stay missing.
fn interpolate_time(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let observed: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    if observed.is_empty() {
        return values.to_vec();
    }

    let mut out = values.to_vec();
    for i in 0..values.len() {
        if values[i].is_some() {
            continue;
        }
        let next_pos = observed.partition_point(|&j| j < i);
        let prev = next_pos.checked_sub(1).map(|p| observed[p]);
        let next = observed.get(next_pos).copied();

        out[i] = match (prev, next) {
            (Some(p), Some(n)) => values[p].zip(values[n]).map(|(vp, vn)| {
                let span = (dates[n] - dates[p]).num_days() as f64;
                let offset = (dates[i] - dates[p]).num_days() as f64;
                if span == 0.0 { vp } else { vp + (vn - vp) * offset / span }
            }),
            (Some(p), None) => values[p],
            (None, _) => None,
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Column;

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn frame(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> PriceFrame {
        PriceFrame::new(dates, vec![Column::new("price", values)]).unwrap()
    }

    fn gappy() -> PriceFrame {
        frame(
            vec![ymd(1), ymd(2), ymd(3), ymd(4), ymd(5)],
            vec![None, Some(1.0), None, Some(3.0), None],
        )
    }

    #[test]
    fn forward_fill_leaves_leading_gap() {
        let out = preprocess_data(&gappy(), FillPolicy::ForwardFill).unwrap();
        assert_eq!(out.column("price").unwrap(), &[None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);
    }

    #[test]
    fn backward_fill_leaves_trailing_gap() {
        let out = preprocess_data(&gappy(), FillPolicy::BackwardFill).unwrap();
        assert_eq!(out.column("price").unwrap(), &[Some(1.0), Some(1.0), Some(3.0), Some(3.0), None]);
    }

    #[test]
    fn drop_removes_incomplete_rows() {
        let out = preprocess_data(&gappy(), FillPolicy::Drop).unwrap();
        assert_eq!(out.dates(), &[ymd(2), ymd(4)]);
    }

    #[test]
    fn interpolation_is_weighted_by_time() {
        // Observations on the 1st and the 5th; gaps on the 2nd and 4th.
        let f = frame(
            vec![ymd(1), ymd(2), ymd(4), ymd(5), ymd(9)],
            vec![Some(10.0), None, None, Some(18.0), None],
        );
        let out = preprocess_data(&f, FillPolicy::Interpolate).unwrap();
        let values = out.column("price").unwrap();
        assert_eq!(values[1], Some(12.0));
        assert_eq!(values[2], Some(16.0));
        assert_eq!(values[4], Some(18.0));
    }

    #[test]
    fn empty_input_and_empty_result_fail() {
        let empty = PriceFrame::default();
        assert_eq!(
            preprocess_data(&empty, FillPolicy::ForwardFill).unwrap_err(),
            ValidationError::Empty("Input frame".into())
        );

        let all_missing = frame(vec![ymd(1), ymd(2)], vec![None, None]);
        assert_eq!(
            preprocess_data(&all_missing, FillPolicy::Drop).unwrap_err(),
            ValidationError::EmptyAfterPreprocessing("drop".into())
        );
    }

    proptest::proptest! {
        #[test]
        fn fills_keep_observations_and_close_every_later_gap(
            values in proptest::collection::vec(proptest::option::of(-100.0f64..100.0), 1..40),
        ) {
            let dates: Vec<NaiveDate> = ymd(1).iter_days().take(values.len()).collect();
            let input = frame(dates, values.clone());
            let first = values.iter().position(Option::is_some).unwrap_or(values.len());

            for policy in [FillPolicy::ForwardFill, FillPolicy::Interpolate] {
                let out = preprocess_data(&input, policy).unwrap();
                let filled = out.column("price").unwrap();
                for (i, (before, after)) in values.iter().zip(filled).enumerate() {
                    if before.is_some() {
                        proptest::prop_assert_eq!(before, after);
                    }
                    proptest::prop_assert_eq!(after.is_some(), i >= first);
                }
            }
        }
    }
}
