use super::autocorrelation::acf;
use crate::distributions::chi2_sf;
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::PriceFrame;
use core_types::numeric::{max, min, observed, sample_std};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Lags of squared returns tested for volatility clustering.
pub const ARCH_TEST_LAGS: usize = 10;
const ARCH_SIGNIFICANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityStats {
    pub mean_volatility: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub max_volatility: Option<f64>,
    pub min_volatility: Option<f64>,
    pub volatility_of_volatility: Option<f64>,
}

/// Ljung-Box test on squared returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArchTest {
    pub ljung_box_statistic: f64,
    pub p_value: f64,
    pub has_arch_effects: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnVolatility {
    /// Date of each return, i.e. of the later of the two prices.
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<f64>,
    pub rolling_volatility: Vec<Option<f64>>,
    pub rolling_volatility_annualized: Vec<Option<f64>>,
    pub stats: VolatilityStats,
    pub arch_test: Option<ArchTest>,
}

/// Simple returns between consecutive observed prices, their rolling
/// standard deviation over `window` returns, and an ARCH-effect check.
pub fn volatility_analysis(
    frame: &PriceFrame,
    window: i64,
) -> Result<BTreeMap<String, ColumnVolatility>, AnalyticsError> {
    if frame.is_empty() {
        return Err(AnalyticsError::EmptyInput("Price frame".to_string()));
    }
    if window <= 0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "window must be positive, got {window}"
        )));
    }
    let window = window as usize;
    let annualize = TRADING_DAYS_PER_YEAR.sqrt();

    let mut results = BTreeMap::new();
    for column in frame.columns() {
        let (dates, returns) = simple_returns(frame.dates(), &column.values);
        if returns.len() < 2 {
            debug!(column = %column.name, "Too few returns for volatility analysis.");
            continue;
        }

        let rolling = rolling_std(&returns, window);
        let rolling_observed = observed(&rolling);
        let mean_volatility = sample_std(&returns);

        results.insert(
            column.name.clone(),
            ColumnVolatility {
                rolling_volatility_annualized: rolling.iter().map(|v| v.map(|s| s * annualize)).collect(),
                stats: VolatilityStats {
                    mean_volatility,
                    annualized_volatility: mean_volatility.map(|s| s * annualize),
                    max_volatility: max(&rolling_observed),
                    min_volatility: min(&rolling_observed),
                    volatility_of_volatility: sample_std(&rolling_observed),
                },
                arch_test: arch_test(&returns),
                rolling_volatility: rolling,
                dates,
                returns,
            },
        );
    }

    info!(columns = results.len(), window, "Volatility analysis completed.");
    Ok(results)
}

fn simple_returns(dates: &[NaiveDate], values: &[Option<f64>]) -> (Vec<NaiveDate>, Vec<f64>) {
    let mut out_dates = Vec::new();
    let mut returns = Vec::new();
    let mut previous: Option<f64> = None;
    for (date, value) in dates.iter().zip(values) {
        let Some(price) = *value else { continue };
        if let Some(prev) = previous.filter(|p| *p != 0.0) {
            out_dates.push(*date);
            returns.push(price / prev - 1.0);
        }
        previous = Some(price);
    }
    (out_dates, returns)
}

fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).checked_sub(window)?;
            sample_std(&values[start..=i])
        })
        .collect()
}

/// `None` when there are too few returns or they have no variation.
fn arch_test(returns: &[f64]) -> Option<ArchTest> {
    let squared: Vec<f64> = returns.iter().map(|r| r * r).collect();
    let n = squared.len();
    if n <= ARCH_TEST_LAGS {
        return None;
    }
    let rho = acf(&squared, ARCH_TEST_LAGS).ok()?;
    let nf = n as f64;
    let q = nf
        * (nf + 2.0)
        * rho
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, r)| r * r / (nf - k as f64))
            .sum::<f64>();
    let p_value = chi2_sf(q, ARCH_TEST_LAGS as f64);
    Some(ArchTest {
        ljung_box_statistic: q,
        p_value,
        has_arch_effects: p_value < ARCH_SIGNIFICANCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_types::Column;

    fn frame(values: Vec<Option<f64>>) -> PriceFrame {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..values.len() as i64).map(|i| start + Duration::days(i)).collect();
        PriceFrame::new(dates, vec![Column::new("price", values)]).unwrap()
    }

    #[test]
    fn returns_skip_missing_prices() {
        let f = frame(vec![Some(100.0), None, Some(110.0), Some(99.0)]);
        let result = volatility_analysis(&f, 2).unwrap();
        let price = &result["price"];
        assert_eq!(price.returns.len(), 2);
        assert!((price.returns[0] - 0.10).abs() < 1e-12);
        assert!((price.returns[1] + 0.10).abs() < 1e-12);
        assert_eq!(price.dates[0], NaiveDate::from_ymd_opt(2020, 1, 3).unwrap());
        assert_eq!(price.rolling_volatility[0], None);
        assert!(price.rolling_volatility[1].is_some());
        assert!(price.arch_test.is_none());
    }

    #[test]
    fn annualized_is_scaled_by_root_252() {
        let prices: Vec<Option<f64>> = (0..60).map(|i| Some(100.0 + (i % 5) as f64)).collect();
        let result = volatility_analysis(&frame(prices), 10).unwrap();
        let stats = result["price"].stats;
        let ratio = stats.annualized_volatility.unwrap() / stats.mean_volatility.unwrap();
        assert!((ratio - 252f64.sqrt()).abs() < 1e-9);
        assert!(stats.max_volatility >= stats.min_volatility);
        assert!(result["price"].arch_test.is_some());
    }

    #[test]
    fn clustered_volatility_is_detected() {
        // Calm and turbulent stretches alternate every 20 days.
        let mut price = 100.0;
        let prices: Vec<Option<f64>> = (0..400)
            .map(|i| {
                let size = if (i / 20) % 2 == 0 { 0.001 } else { 0.05 };
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                price *= 1.0 + sign * size;
                Some(price)
            })
            .collect();
        let arch = volatility_analysis(&frame(prices), 20).unwrap()["price"].arch_test.unwrap();
        assert!(arch.has_arch_effects);
        assert!(arch.p_value < 0.05);
    }

    #[test]
    fn invalid_inputs() {
        assert!(volatility_analysis(&PriceFrame::default(), 5).is_err());
        assert!(volatility_analysis(&frame(vec![Some(1.0), Some(2.0)]), 0).is_err());
    }
}
