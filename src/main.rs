use analytics::eda::{
    ArchTest, AutocorrelationResult, ColumnStats, DEFAULT_LAGS, LinearTrend, StationarityResult,
    VolatilityStats, autocorrelation_analysis, descriptive_statistics, test_stationarity, trend_analysis,
    volatility_analysis,
};
use analytics::{ImpactSummary, align_events_with_prices, calculate_event_impact_statistics};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, LogFormat, WorkerGuard, load_config};
use core_types::{AlignedEvent, FillPolicy, Frequency};
use market_data::{
    PriceLoadOptions, ValidationReport, load_events_with_fallback, load_prices_with_fallback,
    preprocess_data, validate_data, validate_required_columns,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// The main entry point for the Oil Insight application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Analyze(args) => handle_analyze(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Oil price and market event analytics: an HTTP API and a terminal report.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data once and serve the JSON API.
    Serve(ServeArgs),
    /// Run the full analysis pipeline and print the results.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct CommonArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = configuration::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Console log format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Parser)]
struct ServeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Address to bind, overriding `server.host`.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind, overriding `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct AnalyzeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Price CSV to use instead of the configured candidates.
    #[arg(long)]
    price_file: Option<PathBuf>,

    /// Event CSV to use instead of the configured candidates.
    #[arg(long)]
    event_file: Option<PathBuf>,

    /// First date to include (format: YYYY-MM-DD).
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last date to include (format: YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Days on each side of an event, overriding `analysis.window_days`.
    #[arg(long)]
    window_days: Option<i64>,

    /// Missing value policy: forward_fill, backward_fill, interpolate or drop.
    #[arg(long)]
    fill_policy: Option<FillPolicy>,

    /// Resample prices before analysis: D, W or M.
    #[arg(long, default_value = "D")]
    frequency: Frequency,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

/// Loads the configuration file and starts logging. The guard must live until
/// the program exits so buffered file logs are flushed.
fn load_and_init(common: &CommonArgs) -> anyhow::Result<(Config, Option<WorkerGuard>)> {
    let mut config = load_config(&common.config)
        .with_context(|| format!("Failed to load configuration from {}", common.config.display()))?;
    if let Some(format) = common.log_format {
        config.logging.format = format;
    }
    let guard = configuration::init_tracing(&config.logging).context("Failed to initialize logging")?;
    Ok((config, guard))
}

// ==============================================================================
// Serve Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let (mut config, _guard) = load_and_init(&args.common)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    web_server::run_server(config).await
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

/// Everything the analysis pipeline produced, in one serializable value.
#[derive(Serialize)]
struct AnalysisReport {
    validation: ValidationReport,
    aligned_events: Vec<AlignedEvent>,
    skipped_events: usize,
    impact: Vec<ImpactSummary>,
    statistics: BTreeMap<String, BTreeMap<String, ColumnStats>>,
    linear_trend: Option<LinearTrend>,
    stationarity: Option<StationarityResult>,
    volatility: BTreeMap<String, VolatilitySummary>,
    autocorrelation: Option<AutocorrelationResult>,
}

#[derive(Serialize)]
struct VolatilitySummary {
    stats: VolatilityStats,
    arch_test: Option<ArchTest>,
}

fn handle_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let (mut config, _guard) = load_and_init(&args.common)?;
    if let Some(path) = args.price_file {
        config.data.price_paths = vec![path];
    }
    if let Some(path) = args.event_file {
        config.data.event_paths = vec![path];
    }
    if let Some(window) = args.window_days {
        config.analysis.window_days = window;
    }
    if let Some(policy) = args.fill_policy {
        config.analysis.fill_policy = policy;
    }
    config.validate()?;

    let price_column = config.data.price_column.clone();
    let opts = PriceLoadOptions {
        start_date: args.start_date,
        end_date: args.end_date,
        frequency: args.frequency,
        date_column: config.data.date_column.clone(),
    };

    // --- 1. Load and clean the prices ---
    let loaded = load_prices_with_fallback(&config.data.price_paths, &opts, &config.synthetic, &price_column)
        .context("Failed to load price data")?;
    tracing::info!(source = %loaded.source, rows = loaded.frame.len(), "Price data ready.");
    let validation = validate_data(&loaded.frame)?;
    validate_required_columns(&loaded.frame, &[price_column.as_str()])?;
    let frame = preprocess_data(&loaded.frame, config.analysis.fill_policy)?;

    // --- 2. Events and their price impact ---
    let events = load_events_with_fallback(&config.data.event_paths).context("Failed to load event data")?;
    let outcome = align_events_with_prices(&frame, &events.events, config.analysis.window_days, &price_column)?;
    let impact = calculate_event_impact_statistics(&outcome.events);

    // --- 3. Exploratory analysis of the price column ---
    let values = frame.column(&price_column).unwrap_or_default().to_vec();
    let statistics = descriptive_statistics(&frame, None)?;
    let trend = match trend_analysis(&frame, config.analysis.window_days) {
        Ok(analysis) => analysis.columns.get(&price_column).and_then(|c| c.linear_trend),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping trend analysis.");
            None
        }
    };
    let stationarity = test_stationarity(&values, config.analysis.stationarity_alpha)
        .inspect_err(|e| tracing::warn!(error = %e, "Skipping stationarity tests."))
        .ok();
    let autocorrelation = autocorrelation_analysis(&values, DEFAULT_LAGS)
        .inspect_err(|e| tracing::warn!(error = %e, "Skipping autocorrelation analysis."))
        .ok();
    let volatility: BTreeMap<String, VolatilitySummary> = volatility_analysis(&frame, config.analysis.window_days)?
        .into_iter()
        .map(|(name, v)| {
            let summary = VolatilitySummary {
                stats: v.stats,
                arch_test: v.arch_test,
            };
            (name, summary)
        })
        .collect();

    if args.json {
        let report = AnalysisReport {
            validation,
            skipped_events: outcome.skipped.len(),
            aligned_events: outcome.events,
            impact,
            statistics,
            linear_trend: trend,
            stationarity,
            volatility,
            autocorrelation,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_validation(&validation);
    print_events(&outcome.events);
    println!(
        "Aligned {} of {} events ({} skipped).",
        outcome.aligned_count,
        outcome.events.len(),
        outcome.skipped.len()
    );
    print_impact(&impact);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Column", "Count", "Mean", "Std", "Skew", "Kurtosis", "Min", "Max",
    ]);
    for (column, s) in statistics.values().flat_map(|cols| cols.iter()) {
        table.add_row(vec![
            column.clone(),
            s.count.to_string(),
            cell(s.mean),
            cell(s.std),
            cell(s.skewness),
            cell(s.kurtosis),
            cell(s.min),
            cell(s.max),
        ]);
    }
    println!("\nDescriptive statistics\n{table}");

    if let Some(t) = trend {
        println!(
            "Linear trend: slope {:.6}, intercept {:.4}, R² {:.4}, p-value {}",
            t.slope,
            t.intercept,
            t.r_squared,
            cell(t.p_value)
        );
    }
    if let Some(result) = &stationarity {
        print_stationarity(result);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Column", "Volatility", "Annualized", "Max", "Min", "Vol of vol", "Ljung-Box p", "ARCH effects",
    ]);
    for (column, v) in &volatility {
        table.add_row(vec![
            column.clone(),
            cell(v.stats.mean_volatility),
            cell(v.stats.annualized_volatility),
            cell(v.stats.max_volatility),
            cell(v.stats.min_volatility),
            cell(v.stats.volatility_of_volatility),
            cell(v.arch_test.map(|a| a.p_value)),
            v.arch_test.map_or("-".to_string(), |a| a.has_arch_effects.to_string()),
        ]);
    }
    println!("\nVolatility\n{table}");

    if let Some(result) = &autocorrelation {
        print_autocorrelation(result);
    }

    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map_or("-".to_string(), |v| format!("{v:.4}"))
}

fn print_validation(report: &ValidationReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Column", "Missing", "Missing %", "Outliers", "Outliers %"]);
    for (column, missing) in &report.missing_values {
        let outliers = report.outliers.get(column);
        table.add_row(vec![
            column.clone(),
            missing.to_string(),
            cell(report.missing_percentage.get(column).copied()),
            outliers.map_or("-".to_string(), |o| o.count.to_string()),
            cell(outliers.map(|o| o.percentage)),
        ]);
    }
    let range = report
        .date_range
        .map_or("-".to_string(), |(first, last)| format!("{first} to {last}"));
    println!(
        "Data quality: {} observations, {range}, {} duplicate dates\n{table}",
        report.total_observations, report.duplicate_dates
    );
}

fn print_events(events: &[AlignedEvent]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Date", "Type", "Impact", "Before", "After", "Change %", "Window vol",
    ]);
    for e in events {
        table.add_row(vec![
            e.event.event_date.map_or("-".to_string(), |d| d.to_string()),
            e.event.event_type.clone().unwrap_or_default(),
            e.event.impact_type.clone().unwrap_or_default(),
            cell(e.metrics.price_before),
            cell(e.metrics.price_after),
            cell(e.metrics.price_change_pct),
            cell(e.metrics.volatility_window),
        ]);
    }
    println!("\nEvent price impact\n{table}");
}

fn print_impact(rows: &[ImpactSummary]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Category", "Count", "Mean %", "Median %", "Std %", "Max %", "Min %",
    ]);
    for r in rows {
        table.add_row(vec![
            r.category.clone(),
            r.count.to_string(),
            cell(r.mean_price_change_pct),
            cell(r.median_price_change_pct),
            cell(r.std_price_change_pct),
            cell(r.max_price_change_pct),
            cell(r.min_price_change_pct),
        ]);
    }
    println!("\nImpact by category\n{table}");
}

fn print_stationarity(result: &StationarityResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Test", "Statistic", "p-value", "Stationary"]);
    if let Some(adf) = &result.adf {
        table.add_row(vec![
            format!("ADF (lag {})", adf.used_lag),
            format!("{:.4}", adf.test_statistic),
            format!("{:.4}", adf.p_value),
            adf.is_stationary.to_string(),
        ]);
    }
    if let Some(kpss) = &result.kpss {
        table.add_row(vec![
            format!("KPSS (lags {})", kpss.lags),
            format!("{:.4}", kpss.test_statistic),
            format!("{:.4}", kpss.p_value),
            kpss.is_stationary.to_string(),
        ]);
    }
    println!("\nStationarity: {:?}\n{table}", result.conclusion);
}

/// Only the first lags fit on a terminal; the JSON report carries all of them.
fn print_autocorrelation(result: &AutocorrelationResult) {
    const SHOWN_LAGS: usize = 10;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Lag", "ACF", "PACF"]);
    for (lag, (acf, pacf)) in result.acf.iter().zip(&result.pacf).enumerate().skip(1).take(SHOWN_LAGS) {
        table.add_row(vec![lag.to_string(), format!("{acf:.4}"), format!("{pacf:.4}")]);
    }
    println!("\nAutocorrelation\n{table}");
}
