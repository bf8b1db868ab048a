use analytics::align_events_with_prices;
use configuration::Config;
use core_types::{AlignedEvent, DataSource, Event, PriceFrame};
use market_data::{
    LoadError, LoadedEvents, LoadedPrices, PriceLoadOptions, load_events_with_fallback,
    load_prices_with_fallback, preprocess_data, validate_required_columns,
};
use tracing::{error, info, warn};

/// The read-only data every handler works from. Built once before the server
/// starts accepting requests and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub prices: Option<PriceFrame>,
    pub price_source: Option<DataSource>,
    pub events: Option<Vec<Event>>,
    pub event_source: Option<DataSource>,
    /// `None` when either dataset is missing.
    pub aligned: Option<Vec<AlignedEvent>>,
    pub config: Config,
}

impl AppState {
    /// Loads, validates and preprocesses both datasets and aligns them.
    ///
    /// A dataset that fails to load is logged and left unavailable; the routes
    /// that need it then answer 503.
    pub fn initialize(config: Config) -> Self {
        let prices = match load_prices(&config) {
            Ok(prices) => Some(prices),
            Err(e) => {
                error!(error = %e, "Failed to load price data.");
                None
            }
        };
        let events = match load_events_with_fallback(&config.data.event_paths) {
            Ok(events) => Some(events),
            Err(e) => {
                error!(error = %e, "Failed to load event data.");
                None
            }
        };
        Self::from_loaded(config, prices, events)
    }

    /// Builds the state from already loaded data.
    pub fn from_loaded(config: Config, prices: Option<LoadedPrices>, events: Option<LoadedEvents>) -> Self {
        let (prices, price_source) = match prices {
            Some(loaded) => (Some(loaded.frame), Some(loaded.source)),
            None => (None, None),
        };
        let (events, event_source) = match events {
            Some(loaded) => (Some(loaded.events), Some(loaded.source)),
            None => (None, None),
        };

        let aligned = match (&prices, &events) {
            (Some(frame), Some(events)) => Some(align(&config, frame, events)),
            _ => None,
        };

        info!(
            price_data_loaded = prices.is_some(),
            event_data_loaded = events.is_some(),
            "Application state initialized."
        );
        Self {
            prices,
            price_source,
            events,
            event_source,
            aligned,
            config,
        }
    }

    pub fn price_column(&self) -> &str {
        &self.config.data.price_column
    }
}

fn load_prices(config: &Config) -> Result<LoadedPrices, LoadError> {
    let opts = PriceLoadOptions {
        date_column: config.data.date_column.clone(),
        ..PriceLoadOptions::default()
    };
    let loaded = load_prices_with_fallback(
        &config.data.price_paths,
        &opts,
        &config.synthetic,
        &config.data.price_column,
    )?;

    validate_required_columns(&loaded.frame, &[config.data.price_column.as_str()])?;
    let frame = preprocess_data(&loaded.frame, config.analysis.fill_policy)?;
    Ok(LoadedPrices {
        frame,
        source: loaded.source,
    })
}

/// Events that cannot be aligned as a whole are kept without metrics.
fn align(config: &Config, frame: &PriceFrame, events: &[Event]) -> Vec<AlignedEvent> {
    match align_events_with_prices(
        frame,
        events,
        config.analysis.window_days,
        &config.data.price_column,
    ) {
        Ok(outcome) => outcome.events,
        Err(e) => {
            warn!(error = %e, "Event alignment failed, serving events without price metrics.");
            events.iter().cloned().map(AlignedEvent::unaligned).collect()
        }
    }
}
