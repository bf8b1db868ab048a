//! # Market Data
//!
//! Everything between a file on disk and an in-memory [`PriceFrame`] or event
//! list: CSV loading with candidate-path fallback, seeded synthetic data,
//! calendar resampling, data quality validation and missing value handling.
//!
//! Loading follows a fixed policy:
//! 1. Walk the ordered candidate paths and use the first one that exists.
//! 2. If that file is empty, malformed or lacks required columns, fail.
//! 3. If no candidate exists, generate synthetic data (tagged as such).
//!
//! [`PriceFrame`]: core_types::PriceFrame

pub mod error;
pub mod loader;
pub mod preprocess;
pub mod resample;
pub mod synthetic;
pub mod validation;

pub use error::{LoadError, ValidationError};
pub use loader::{
    LoadedEvents, LoadedPrices, PriceLoadOptions, first_existing, load_event_data,
    load_events_with_fallback, load_price_data, load_prices_with_fallback,
};
pub use preprocess::preprocess_data;
pub use validation::{OutlierSummary, ValidationReport, validate_data, validate_required_columns};
