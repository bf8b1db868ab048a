//! Exploratory analysis of price frames: descriptive statistics, trend,
//! stationarity, volatility and autocorrelation.
//!
//! Every function here is a pure calculation over its inputs.

pub mod autocorrelation;
pub mod descriptive;
mod regression;
pub mod stationarity;
pub mod trend;
pub mod volatility;

pub use autocorrelation::{AutocorrelationResult, DEFAULT_LAGS, autocorrelation_analysis};
pub use descriptive::{ColumnStats, Period, calculate_stats, descriptive_statistics};
pub use stationarity::{AdfResult, KpssResult, StationarityConclusion, StationarityResult, test_stationarity};
pub use trend::{ColumnTrend, LinearTrend, TrendAnalysis, rolling_mean, trend_analysis};
pub use volatility::{ArchTest, ColumnVolatility, VolatilityStats, volatility_analysis};
