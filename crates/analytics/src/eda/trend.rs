use super::regression::ols;
use crate::distributions::student_t_two_sided_p;
use crate::error::AnalyticsError;
use core_types::PriceFrame;
use core_types::numeric::observed;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Least-squares line through the observed values against their position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value of the slope; `None` with fewer than three points.
    pub p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnTrend {
    /// Rolling mean over `window` rows.
    pub moving_average: Vec<Option<f64>>,
    /// Rolling mean over `2 * window` rows.
    pub long_moving_average: Vec<Option<f64>>,
    pub linear_trend: Option<LinearTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub window: usize,
    pub columns: BTreeMap<String, ColumnTrend>,
}

/// Rolling mean with full-window semantics: an entry is `None` until `window`
/// rows are available and whenever the window contains a missing cell.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            let start = (i + 1).checked_sub(window)?;
            let slice = &values[start..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / window as f64)
        })
        .collect()
}

pub fn linear_trend(values: &[f64]) -> Result<LinearTrend, AnalyticsError> {
    let n = values.len();
    if n < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "linear trend needs at least 2 observations, got {n}"
        )));
    }

    let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { r as f64 });
    let y = DVector::from_column_slice(values);

    let (intercept, slope, ssr, se) = if n == 2 {
        let slope = values[1] - values[0];
        (values[0], slope, 0.0, 0.0)
    } else {
        let fit = ols(&x, &y)?;
        (fit.params[0], fit.params[1], fit.ssr, fit.std_errors[1])
    };

    let y_mean = y.mean();
    let sst: f64 = values.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst == 0.0 { 0.0 } else { 1.0 - ssr / sst };

    let p_value = (n > 2).then(|| {
        if se == 0.0 {
            if slope == 0.0 { 1.0 } else { 0.0 }
        } else {
            student_t_two_sided_p(slope / se, (n - 2) as f64)
        }
    });

    Ok(LinearTrend {
        slope,
        intercept,
        r_squared,
        p_value,
    })
}

/// Moving averages and a linear trend for every column with at least
/// `window` observations.
pub fn trend_analysis(frame: &PriceFrame, window: i64) -> Result<TrendAnalysis, AnalyticsError> {
    if frame.is_empty() {
        return Err(AnalyticsError::EmptyInput("Price frame".to_string()));
    }
    if window <= 0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "window must be positive, got {window}"
        )));
    }
    let window = window as usize;
    if window > frame.len() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "window ({window}) exceeds data length ({})",
            frame.len()
        )));
    }
    if frame.columns().is_empty() {
        return Err(AnalyticsError::EmptyInput("Numeric column list".to_string()));
    }

    let mut columns = BTreeMap::new();
    for column in frame.columns() {
        let values = observed(&column.values);
        if values.len() < window {
            warn!(column = %column.name, observed = values.len(), window, "Insufficient data for trend analysis.");
            continue;
        }
        columns.insert(
            column.name.clone(),
            ColumnTrend {
                moving_average: rolling_mean(&column.values, window),
                long_moving_average: rolling_mean(&column.values, 2 * window),
                linear_trend: linear_trend(&values).ok(),
            },
        );
    }

    if columns.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no column has enough observations for trend analysis".to_string(),
        ));
    }

    info!(columns = columns.len(), window, "Trend analysis completed.");
    Ok(TrendAnalysis { window, columns })
}
