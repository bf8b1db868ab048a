use crate::error::AnalyticsError;
use core_types::numeric::{mean, observed};
use serde::Serialize;

/// Lag count used when the caller has no preference.
pub const DEFAULT_LAGS: usize = 40;

/// Autocorrelations at lags `0..=lags`; both vectors start with `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocorrelationResult {
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
}

/// ACF and PACF of the observed values of a series. `lags` is capped at one
/// less than the number of observations.
pub fn autocorrelation_analysis(values: &[Option<f64>], lags: usize) -> Result<AutocorrelationResult, AnalyticsError> {
    let x = observed(values);
    let acf = acf(&x, lags)?;
    let pacf = pacf_from_acf(&acf);
    Ok(AutocorrelationResult { acf, pacf })
}

/// Sample autocorrelation with the biased (`1/n`) autocovariance estimator.
pub fn acf(x: &[f64], lags: usize) -> Result<Vec<f64>, AnalyticsError> {
    if x.len() < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "autocorrelation needs at least 2 observations, got {}",
            x.len()
        )));
    }
    let m = mean(x).unwrap_or_default();
    let centered: Vec<f64> = x.iter().map(|v| v - m).collect();
    let c0: f64 = centered.iter().map(|v| v * v).sum();
    if c0 == 0.0 {
        return Err(AnalyticsError::Calculation(
            "autocorrelation of a constant series is undefined".to_string(),
        ));
    }

    let lags = lags.min(x.len() - 1);
    Ok((0..=lags)
        .map(|k| centered[k..].iter().zip(&centered).map(|(a, b)| a * b).sum::<f64>() / c0)
        .collect())
}

/// Durbin-Levinson recursion over an autocorrelation sequence.
fn pacf_from_acf(rho: &[f64]) -> Vec<f64> {
    let mut pacf = Vec::with_capacity(rho.len());
    pacf.push(1.0);
    let mut phi: Vec<f64> = Vec::new();

    for k in 1..rho.len() {
        let num = rho[k] - phi.iter().enumerate().map(|(j, p)| p * rho[k - 1 - j]).sum::<f64>();
        let den = 1.0 - phi.iter().enumerate().map(|(j, p)| p * rho[j + 1]).sum::<f64>();
        let phi_kk = if den == 0.0 { 0.0 } else { num / den };

        let mut next: Vec<f64> = phi
            .iter()
            .enumerate()
            .map(|(j, p)| p - phi_kk * phi[k - 2 - j])
            .collect();
        next.push(phi_kk);
        phi = next;
        pacf.push(phi_kk);
    }
    pacf
}
