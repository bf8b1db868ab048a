use crate::error::AppError;
use crate::params::{AnalysisQuery, DateRange, DateRangeQuery, EventQuery, validate_filter_value};
use crate::responses::ApiResponse;
use crate::state::AppState;
use analytics::eda::{
    ArchTest, AutocorrelationResult, ColumnStats, DEFAULT_LAGS, LinearTrend, StationarityResult,
    VolatilityStats, autocorrelation_analysis, test_stationarity, trend_analysis, volatility_analysis,
};
use analytics::{AnalyticsError, ImpactSummary, calculate_event_impact_statistics};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use core_types::numeric::{max, mean, median, min, observed, sample_std};
use core_types::{AlignedEvent, Column, DataSource, Event, PriceFrame};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

const PRICE_UNAVAILABLE: &str = "Price data is not available. Please ensure data files are loaded.";
const EVENTS_UNAVAILABLE: &str = "Event data is not available. Please ensure data files are loaded.";

#[derive(Debug, Serialize)]
pub struct DataSources {
    pub prices: Option<DataSource>,
    pub events: Option<DataSource>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub price_data_loaded: bool,
    pub event_data_loaded: bool,
    pub data_source: DataSources,
}

#[derive(Debug, Serialize)]
pub struct PriceDataResponse {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<Option<f64>>,
    pub count: usize,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct EventFilters {
    pub event_types: Vec<String>,
    pub impact_types: Vec<String>,
    pub severities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceStatistics {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub observations: usize,
    pub window: i64,
    pub statistics: ColumnStats,
    pub linear_trend: Option<LinearTrend>,
    /// `None` when there are too few observations to test.
    pub stationarity: Option<StationarityResult>,
    pub volatility: Option<VolatilityStats>,
    pub arch_test: Option<ArchTest>,
    pub autocorrelation: Option<AutocorrelationResult>,
}

#[derive(Debug, Serialize)]
pub struct ChangePoint {
    pub date: &'static str,
    pub change_type: &'static str,
    pub description: &'static str,
    pub confidence: f64,
}

/// # GET /api/health
/// Liveness and data availability. Not wrapped in the success envelope.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        price_data_loaded: state.prices.is_some(),
        event_data_loaded: state.events.is_some(),
        data_source: DataSources {
            prices: state.price_source.clone(),
            events: state.event_source.clone(),
        },
    })
}

/// # GET /api/price-data
pub async fn get_price_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<ApiResponse<PriceDataResponse>, AppError> {
    let range = query.parse()?;
    let frame = filtered_prices(&state, range)?;
    let prices = price_values(&state, &frame)?;

    Ok(ApiResponse::ok(PriceDataResponse {
        count: frame.len(),
        min_date: frame.first_date(),
        max_date: frame.last_date(),
        dates: frame.dates().to_vec(),
        prices: prices.to_vec(),
    }))
}

/// # GET /api/events
/// Filter values are checked against the values present after date filtering.
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> Result<ApiResponse<EventsResponse>, AppError> {
    let events = state
        .events
        .as_ref()
        .ok_or_else(|| AppError::DataUnavailable(EVENTS_UNAVAILABLE.to_string()))?;
    let range = query.date_range()?;

    let mut filtered: Vec<&Event> = events
        .iter()
        .filter(|e| range.is_unbounded() || e.event_date.is_some_and(|d| range.contains(d)))
        .collect();

    let filters: [(Option<&str>, &str, fn(&Event) -> Option<&str>); 3] = [
        (query.event_type.as_deref(), "event_type", |e| e.event_type.as_deref()),
        (query.impact_type.as_deref(), "impact_type", |e| e.impact_type.as_deref()),
        (query.severity.as_deref(), "severity", |e| e.severity.as_deref()),
    ];
    // Allowed values come from the date-filtered events, before any category narrowing.
    let allowed: Vec<BTreeSet<&str>> = filters
        .iter()
        .map(|(_, _, field)| distinct(filtered.iter().copied(), *field))
        .collect();
    for ((requested, name, field), allowed) in filters.into_iter().zip(&allowed) {
        if let Some(value) = validate_filter_value(requested, allowed, name)? {
            filtered.retain(|e| field(e) == Some(value));
        }
    }

    let events: Vec<Event> = filtered.into_iter().cloned().collect();
    Ok(ApiResponse::ok(EventsResponse {
        count: events.len(),
        events,
    }))
}

/// # GET /api/event-filters
pub async fn get_event_filters(State(state): State<Arc<AppState>>) -> Result<ApiResponse<EventFilters>, AppError> {
    let events = state
        .events
        .as_ref()
        .ok_or_else(|| AppError::DataUnavailable(EVENTS_UNAVAILABLE.to_string()))?;

    let sorted = |field: fn(&Event) -> Option<&str>| -> Vec<String> {
        distinct(events.iter(), field).into_iter().map(str::to_string).collect()
    };
    Ok(ApiResponse::ok(EventFilters {
        event_types: sorted(|e| e.event_type.as_deref()),
        impact_types: sorted(|e| e.impact_type.as_deref()),
        severities: sorted(|e| e.severity.as_deref()),
    }))
}

/// # GET /api/statistics
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<ApiResponse<PriceStatistics>, AppError> {
    let range = query.parse()?;
    let frame = filtered_prices(&state, range)?;
    let values = observed(price_values(&state, &frame)?);
    if values.is_empty() {
        return Err(AppError::Validation("Filtered price data has no observed prices".to_string()));
    }

    Ok(ApiResponse::ok(PriceStatistics {
        mean: mean(&values),
        median: median(&values),
        std: sample_std(&values),
        min: min(&values),
        max: max(&values),
        count: frame.len(),
    }))
}

/// # GET /api/event-correlation
pub async fn get_event_correlation(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<AlignedEvent>>, AppError> {
    Ok(ApiResponse::ok(aligned_events(&state)?.to_vec()))
}

/// # GET /api/event-impact
pub async fn get_event_impact(State(state): State<Arc<AppState>>) -> Result<ApiResponse<Vec<ImpactSummary>>, AppError> {
    Ok(ApiResponse::ok(calculate_event_impact_statistics(aligned_events(&state)?)))
}

/// # GET /api/analysis
/// Exploratory summary of the price column over an optional date range.
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<ApiResponse<AnalysisResponse>, AppError> {
    let range = query.date_range()?;
    let window = query.window(state.config.analysis.window_days)?;
    let frame = filtered_prices(&state, range)?;
    let name = state.price_column();
    let values = price_values(&state, &frame)?.to_vec();

    let observations = values.iter().flatten().count();
    if window as usize > frame.len() {
        return Err(AppError::Validation(format!(
            "window ({window}) exceeds the number of observations ({})",
            frame.len()
        )));
    }

    let single = PriceFrame::new(frame.dates().to_vec(), vec![Column::new(name, values.clone())])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let linear_trend = match trend_analysis(&single, window) {
        Ok(mut analysis) => analysis.columns.remove(name).and_then(|c| c.linear_trend),
        Err(AnalyticsError::InsufficientData(reason)) => {
            tracing::warn!(%reason, "Skipping trend analysis.");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let stationarity = match test_stationarity(&values, state.config.analysis.stationarity_alpha) {
        Ok(result) => Some(result),
        Err(AnalyticsError::InsufficientData(reason)) => {
            tracing::warn!(%reason, "Skipping stationarity tests.");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let autocorrelation = autocorrelation_analysis(&values, DEFAULT_LAGS)
        .inspect_err(|e| tracing::warn!(error = %e, "Skipping autocorrelation analysis."))
        .ok();

    let mut volatility = volatility_analysis(&single, window)?;
    let column_volatility = volatility.remove(name);

    Ok(ApiResponse::ok(AnalysisResponse {
        start_date: frame.first_date(),
        end_date: frame.last_date(),
        observations,
        window,
        statistics: ColumnStats::from_values(&values),
        linear_trend,
        stationarity,
        volatility: column_volatility.as_ref().map(|v| v.stats),
        arch_test: column_volatility.and_then(|v| v.arch_test),
        autocorrelation,
    }))
}

/// # GET /api/change-points
/// Static sample of structural breaks; no detection algorithm runs here.
pub async fn get_change_points() -> ApiResponse<Vec<ChangePoint>> {
    ApiResponse::ok(vec![
        ChangePoint {
            date: "2008-09-15",
            change_type: "mean_shift",
            description: "Global financial crisis demand collapse",
            confidence: 0.95,
        },
        ChangePoint {
            date: "2014-11-27",
            change_type: "trend_reversal",
            description: "OPEC keeps production unchanged, start of the 2014-2016 price slump",
            confidence: 0.9,
        },
        ChangePoint {
            date: "2020-03-09",
            change_type: "volatility_shift",
            description: "COVID-19 demand shock and price war",
            confidence: 0.97,
        },
        ChangePoint {
            date: "2022-02-24",
            change_type: "mean_shift",
            description: "Russia-Ukraine conflict supply risk premium",
            confidence: 0.92,
        },
    ])
}

/// The loaded price frame restricted to `range`. An empty result is the
/// caller's fault.
fn filtered_prices(state: &AppState, range: DateRange) -> Result<PriceFrame, AppError> {
    let frame = state
        .prices
        .as_ref()
        .ok_or_else(|| AppError::DataUnavailable(PRICE_UNAVAILABLE.to_string()))?;
    let filtered = frame.filter_by_date(range.start, range.end);
    if filtered.is_empty() {
        return Err(AppError::Validation("Filtered price data is empty".to_string()));
    }
    Ok(filtered)
}

fn price_values<'a>(state: &AppState, frame: &'a PriceFrame) -> Result<&'a [Option<f64>], AppError> {
    frame
        .column(state.price_column())
        .ok_or_else(|| AppError::Internal(format!("price column '{}' missing from loaded data", state.price_column())))
}

fn aligned_events(state: &AppState) -> Result<&[AlignedEvent], AppError> {
    if state.events.is_none() {
        return Err(AppError::DataUnavailable(EVENTS_UNAVAILABLE.to_string()));
    }
    state
        .aligned
        .as_deref()
        .ok_or_else(|| AppError::DataUnavailable(PRICE_UNAVAILABLE.to_string()))
}

fn distinct<'a>(events: impl Iterator<Item = &'a Event>, field: fn(&Event) -> Option<&str>) -> BTreeSet<&'a str> {
    events.filter_map(field).collect()
}
