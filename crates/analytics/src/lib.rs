//! # Oil Insight Analytics
//!
//! This crate holds the quantitative side of the system: measuring how prices
//! moved around market events, summarizing those moves per category, and the
//! exploratory statistics served by the analysis endpoint.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** This crate has no knowledge of files, HTTP or
//!   configuration. It depends only on `core-types`, and every function is a
//!   calculation from its inputs to a serializable result.
//! - **Fail fast on structure, recover per row:** Malformed inputs (an empty
//!   frame, a missing column, an unordered index) are errors. Problems with a
//!   single event only leave that event's metrics empty and are reported
//!   alongside the result.
//!
//! ## Public API
//!
//! - `align_events_with_prices`: Attaches before/after price metrics to events.
//! - `calculate_event_impact_statistics`: Per-category impact summaries.
//! - `eda`: Descriptive statistics, trend, stationarity, volatility and autocorrelation.
//! - `distributions`: The special functions behind the p-values.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod alignment;
pub mod distributions;
pub mod eda;
pub mod error;
pub mod impact;

// Re-export the key components to create a clean, public-facing API.
pub use alignment::{
    AlignmentOutcome, SkipReason, SkippedEvent, align_events_with_prices,
};
pub use error::AnalyticsError;
pub use impact::{EventCategories, ImpactSummary, calculate_event_impact_statistics, categorize_events};
