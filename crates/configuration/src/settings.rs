use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::FillPolicy;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty or missing `config.toml` yields a
/// working setup that falls back to synthetic data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub synthetic: SyntheticConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Rejects settings that would only fail later, deep inside a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.window_days <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.window_days must be positive, got {}",
                self.analysis.window_days
            )));
        }
        let alpha = self.analysis.stationarity_alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "analysis.stationarity_alpha must be between 0 and 1, got {alpha}"
            )));
        }
        if self.data.price_paths.is_empty() || self.data.event_paths.is_empty() {
            return Err(ConfigError::ValidationError(
                "data.price_paths and data.event_paths must list at least one candidate".to_string(),
            ));
        }
        if self.data.price_column.trim().is_empty() {
            return Err(ConfigError::ValidationError("data.price_column must not be empty".to_string()));
        }
        self.synthetic.validate()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Where the price and event files are looked up, in priority order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub price_paths: Vec<PathBuf>,
    pub event_paths: Vec<PathBuf>,
    /// Column of the price file that holds the price.
    pub price_column: String,
    /// Date column of the price file. The first column is used when unset.
    pub date_column: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            price_paths: vec![
                PathBuf::from("data/raw/brent_prices.csv"),
                PathBuf::from("../data/raw/brent_prices.csv"),
            ],
            event_paths: vec![
                PathBuf::from("data/raw/oil_market_events.csv"),
                PathBuf::from("../data/raw/oil_market_events.csv"),
            ],
            price_column: "price".to_string(),
            date_column: None,
        }
    }
}

/// Calendar days on each side of an event when no window is configured.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Parameters of the event alignment and the exploratory analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Half-width of the window around each event, in calendar days.
    pub window_days: i64,
    pub fill_policy: FillPolicy,
    pub stationarity_alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            fill_policy: FillPolicy::ForwardFill,
            stationarity_alpha: 0.05,
        }
    }
}

/// Shape of the generated price series used when no price file exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_price: f64,
    /// Mean daily return of the random walk.
    pub drift: f64,
    /// Standard deviation of the daily return.
    pub volatility: f64,
    pub seed: u64,
}

impl SyntheticConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::ValidationError(format!(
                "synthetic.start_date ({}) must not be after synthetic.end_date ({})",
                self.start_date, self.end_date
            )));
        }
        if self.initial_price <= 0.0 {
            return Err(ConfigError::ValidationError(
                "synthetic.initial_price must be positive".to_string(),
            ));
        }
        if self.volatility < 0.0 {
            return Err(ConfigError::ValidationError(
                "synthetic.volatility must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            initial_price: 20.0,
            drift: 0.0005,
            volatility: 0.015,
            seed: 42,
        }
    }
}

/// Output style of the console log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to daily rolling files in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
            file_prefix: "oil-insight.log".to_string(),
        }
    }
}
