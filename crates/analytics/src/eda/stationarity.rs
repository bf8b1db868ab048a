//! Unit root (ADF) and trend stationarity (KPSS) tests.
//!
//! The ADF p-value uses MacKinnon's (1994) response surface for a regression
//! with a constant, and its critical values the finite-sample surface of
//! MacKinnon (2010). The KPSS statistic uses a Bartlett long-run variance with
//! the bandwidth rule of Hobijn et al. (1998).

use super::regression::{OlsFit, ols};
use crate::distributions::normal_cdf;
use crate::error::AnalyticsError;
use core_types::numeric::observed;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Fewest observations either test is run on.
pub const MIN_OBSERVATIONS: usize = 10;

const ADF_TAU_MAX: f64 = 2.74;
const ADF_TAU_MIN: f64 = -18.83;
const ADF_TAU_STAR: f64 = -1.61;
const ADF_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const ADF_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];
const ADF_CRITICAL: [(&str, [f64; 4]); 3] = [
    ("1%", [-3.43035, -6.5393, -16.786, -79.433]),
    ("5%", [-2.86154, -2.8903, -4.234, -40.040]),
    ("10%", [-2.56677, -1.5384, -2.809, 0.0]),
];

const KPSS_CRITICAL: [f64; 4] = [0.119, 0.146, 0.176, 0.216];
const KPSS_P: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_LABELS: [&str; 4] = ["10%", "5%", "2.5%", "1%"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfResult {
    pub test_statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: BTreeMap<String, f64>,
    pub is_stationary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpssResult {
    pub test_statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    pub critical_values: BTreeMap<String, f64>,
    pub is_stationary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StationarityConclusion {
    Stationary,
    #[serde(rename = "Non-stationary")]
    NonStationary,
    #[serde(rename = "Inconclusive - conflicting results")]
    Inconclusive,
    #[serde(rename = "Unable to determine")]
    UnableToDetermine,
}

impl StationarityConclusion {
    /// Combines the two verdicts; `None` means the test could not be run.
    pub fn from_verdicts(adf_stationary: Option<bool>, kpss_stationary: Option<bool>) -> Self {
        match (adf_stationary, kpss_stationary) {
            (Some(true), Some(true)) => Self::Stationary,
            (Some(false), Some(false)) => Self::NonStationary,
            (Some(_), Some(_)) => Self::Inconclusive,
            _ => Self::UnableToDetermine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationarityResult {
    pub adf: Option<AdfResult>,
    pub kpss: Option<KpssResult>,
    pub conclusion: StationarityConclusion,
}

/// Runs both tests on the observed values of a series.
///
/// A failing test is logged and reported as `None`; only bad parameters and
/// too few observations are errors.
pub fn test_stationarity(values: &[Option<f64>], alpha: f64) -> Result<StationarityResult, AnalyticsError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalyticsError::InvalidParameter(format!(
            "alpha must be between 0 and 1, got {alpha}"
        )));
    }
    let x = observed(values);
    if x.len() < MIN_OBSERVATIONS {
        return Err(AnalyticsError::InsufficientData(format!(
            "{} observations for stationarity testing (minimum {MIN_OBSERVATIONS} required)",
            x.len()
        )));
    }

    let adf = adf_test(&x, alpha)
        .inspect_err(|e| warn!(error = %e, "ADF test failed."))
        .ok();
    let kpss = kpss_test(&x, alpha)
        .inspect_err(|e| warn!(error = %e, "KPSS test failed."))
        .ok();

    let conclusion = StationarityConclusion::from_verdicts(
        adf.as_ref().map(|r| r.is_stationary),
        kpss.as_ref().map(|r| r.is_stationary),
    );
    info!(?conclusion, "Stationarity test completed.");
    Ok(StationarityResult { adf, kpss, conclusion })
}

/// Augmented Dickey-Fuller test with a constant, lag order chosen by AIC.
pub fn adf_test(x: &[f64], alpha: f64) -> Result<AdfResult, AnalyticsError> {
    let n = x.len();
    let max_lag_bound = (n / 2).checked_sub(2).ok_or_else(|| {
        AnalyticsError::InsufficientData(format!("{n} observations are too few for the ADF test"))
    })?;
    let max_lag = ((12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize).min(max_lag_bound);

    // Every candidate lag is fitted on the same sample so the AICs compare.
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let aic = adf_regression(x, lag, max_lag)?.aic();
        if best.is_none_or(|(best_aic, _)| aic < best_aic) {
            best = Some((aic, lag));
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let fit = adf_regression(x, used_lag, used_lag)?;
    let test_statistic = fit.t_value(1);
    if !test_statistic.is_finite() {
        return Err(AnalyticsError::Calculation("ADF statistic is not finite".to_string()));
    }
    let nobs = fit.residuals.len();
    let p_value = mackinnon_p(test_statistic);

    let critical_values = ADF_CRITICAL
        .iter()
        .map(|(label, b)| {
            let inv = 1.0 / nobs as f64;
            let value = b[0] + b[1] * inv + b[2] * inv.powi(2) + b[3] * inv.powi(3);
            (label.to_string(), value)
        })
        .collect();

    Ok(AdfResult {
        test_statistic,
        p_value,
        used_lag,
        nobs,
        critical_values,
        is_stationary: p_value < alpha,
    })
}

/// Regresses `dx[t]` on a constant, `x[t]` and `dx[t-1..=t-lags]` for
/// `t >= sample_start`, where `dx[t] = x[t+1] - x[t]`.
fn adf_regression(x: &[f64], lags: usize, sample_start: usize) -> Result<OlsFit, AnalyticsError> {
    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let rows = dx.len().saturating_sub(sample_start);
    let design = DMatrix::from_fn(rows, 2 + lags, |r, c| {
        let t = sample_start + r;
        match c {
            0 => 1.0,
            1 => x[t],
            j => dx[t + 1 - j],
        }
    });
    let endog = DVector::from_iterator(rows, dx[sample_start..].iter().copied());
    ols(&design, &endog)
}

fn mackinnon_p(tau: f64) -> f64 {
    if tau > ADF_TAU_MAX {
        return 1.0;
    }
    if tau < ADF_TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if tau <= ADF_TAU_STAR { &ADF_SMALL_P } else { &ADF_LARGE_P };
    let poly = coefs.iter().rev().fold(0.0, |acc, c| acc * tau + c);
    normal_cdf(poly)
}

/// KPSS test around a linear trend.
pub fn kpss_test(x: &[f64], alpha: f64) -> Result<KpssResult, AnalyticsError> {
    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { (r + 1) as f64 });
    let y = DVector::from_column_slice(x);
    let resid: Vec<f64> = ols(&design, &y)?.residuals.iter().copied().collect();

    let lags = hobijn_lags(&resid).min(n - 1);

    let mut partial = 0.0;
    let eta = resid
        .iter()
        .map(|e| {
            partial += e;
            partial * partial
        })
        .sum::<f64>()
        / (n as f64).powi(2);

    let long_run_variance = bartlett_variance(&resid, lags);
    if long_run_variance <= 0.0 {
        return Err(AnalyticsError::Calculation("KPSS long-run variance is zero".to_string()));
    }
    let test_statistic = eta / long_run_variance;
    let p_value = kpss_p(test_statistic);

    let critical_values = KPSS_LABELS
        .iter()
        .zip(KPSS_CRITICAL)
        .map(|(label, value)| (label.to_string(), value))
        .collect();

    Ok(KpssResult {
        test_statistic,
        p_value,
        lags,
        critical_values,
        is_stationary: p_value > alpha,
    })
}

/// `sum_{t>=i} e[t] * e[t-i]`.
fn autocovariance_sum(e: &[f64], i: usize) -> f64 {
    e[i..].iter().zip(e).map(|(a, b)| a * b).sum()
}

fn hobijn_lags(resid: &[f64]) -> usize {
    let n = resid.len() as f64;
    let cov_lags = n.powf(2.0 / 9.0) as usize;
    let mut s0 = resid.iter().map(|e| e * e).sum::<f64>() / n;
    let mut s1 = 0.0;
    for i in 1..=cov_lags.min(resid.len().saturating_sub(1)) {
        let prod = autocovariance_sum(resid, i) / (n / 2.0);
        s0 += prod;
        s1 += i as f64 * prod;
    }
    if s0 == 0.0 {
        return 0;
    }
    let s_hat = s1 / s0;
    let gamma = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
    (gamma * n.powf(1.0 / 3.0)) as usize
}

fn bartlett_variance(resid: &[f64], lags: usize) -> f64 {
    let n = resid.len();
    let mut s = resid.iter().map(|e| e * e).sum::<f64>();
    for i in 1..=lags.min(n.saturating_sub(1)) {
        let weight = 1.0 - i as f64 / (lags + 1) as f64;
        s += 2.0 * autocovariance_sum(resid, i) * weight;
    }
    s / n as f64
}

/// Linear interpolation in the KPSS table, clipped to its end points.
fn kpss_p(stat: f64) -> f64 {
    if stat <= KPSS_CRITICAL[0] {
        return KPSS_P[0];
    }
    for i in 1..KPSS_CRITICAL.len() {
        if stat <= KPSS_CRITICAL[i] {
            let frac = (stat - KPSS_CRITICAL[i - 1]) / (KPSS_CRITICAL[i] - KPSS_CRITICAL[i - 1]);
            return KPSS_P[i - 1] + frac * (KPSS_P[i] - KPSS_P[i - 1]);
        }
    }
    KPSS_P[KPSS_P.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn white_noise(n: usize, seed: u64) -> Vec<Option<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| Some(rng.gen_range(-1.0..1.0))).collect()
    }

    #[test]
    fn rejects_bad_parameters() {
        let x = white_noise(50, 1);
        assert!(matches!(test_stationarity(&x, 0.0), Err(AnalyticsError::InvalidParameter(_))));
        assert!(matches!(test_stationarity(&x, 1.0), Err(AnalyticsError::InvalidParameter(_))));

        let mut short = white_noise(12, 1);
        short[0] = None;
        short[1] = None;
        short[2] = None;
        assert!(matches!(test_stationarity(&short, 0.05), Err(AnalyticsError::InsufficientData(_))));
    }

    #[test]
    fn conclusion_truth_table() {
        use StationarityConclusion::*;
        assert_eq!(StationarityConclusion::from_verdicts(Some(true), Some(true)), Stationary);
        assert_eq!(StationarityConclusion::from_verdicts(Some(false), Some(false)), NonStationary);
        assert_eq!(StationarityConclusion::from_verdicts(Some(true), Some(false)), Inconclusive);
        assert_eq!(StationarityConclusion::from_verdicts(Some(false), Some(true)), Inconclusive);
        assert_eq!(StationarityConclusion::from_verdicts(None, Some(true)), UnableToDetermine);
        assert_eq!(StationarityConclusion::from_verdicts(Some(true), None), UnableToDetermine);
    }

    #[test]
    fn white_noise_has_no_unit_root() {
        let result = test_stationarity(&white_noise(500, 42), 0.05).unwrap();
        let adf = result.adf.unwrap();
        assert!(adf.test_statistic < adf.critical_values["1%"]);
        assert!(adf.p_value < 0.05);
        assert!(adf.is_stationary);
    }

    #[test]
    fn p_values_stay_in_their_ranges() {
        let result = test_stationarity(&white_noise(200, 7), 0.05).unwrap();
        let kpss = result.kpss.unwrap();
        assert!((0.01..=0.10).contains(&kpss.p_value));
        assert!((0.0..=1.0).contains(&result.adf.unwrap().p_value));
    }

    #[test]
    fn mackinnon_surface_edges() {
        assert_eq!(mackinnon_p(3.0), 1.0);
        assert_eq!(mackinnon_p(-20.0), 0.0);
        // Around the usual 5% critical value.
        assert!((mackinnon_p(-2.86) - 0.05).abs() < 0.01);
    }

    #[test]
    fn kpss_table_interpolation() {
        assert_eq!(kpss_p(0.05), 0.10);
        assert!((kpss_p(0.146) - 0.05).abs() < 1e-12);
        assert!((kpss_p(0.161) - 0.0375).abs() < 1e-12);
        assert_eq!(kpss_p(1.0), 0.01);
    }
}
