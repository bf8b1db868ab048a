use crate::error::LoadError;
use crate::resample::resample_last;
use crate::synthetic;
use chrono::NaiveDate;
use configuration::SyntheticConfig;
use core_types::dates::parse_date_flexible;
use core_types::{Column, DataSource, Event, Frequency, PriceFrame};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Column every event file must provide.
pub const EVENT_DATE_COLUMN: &str = "event_date";

const MISSING_TOKENS: [&str; 6] = ["", "na", "n/a", "nan", "null", "."];

/// Options controlling how a price file is read.
#[derive(Debug, Clone, Default)]
pub struct PriceLoadOptions {
    /// Inclusive lower bound on the index.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the index.
    pub end_date: Option<NaiveDate>,
    pub frequency: Frequency,
    /// Header of the date column. The first column is used when `None`.
    pub date_column: Option<String>,
}

/// A price table together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub frame: PriceFrame,
    pub source: DataSource,
}

/// An event list together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedEvents {
    pub events: Vec<Event>,
    pub source: DataSource,
}

/// Returns the first candidate that exists on disk.
pub fn first_existing(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|p| p.exists())
}

/// Loads prices from the first existing candidate, or generates a synthetic
/// series named `price_column` when none exists.
pub fn load_prices_with_fallback(
    candidates: &[PathBuf],
    opts: &PriceLoadOptions,
    synthetic_config: &SyntheticConfig,
    price_column: &str,
) -> Result<LoadedPrices, LoadError> {
    if let Some(path) = first_existing(candidates) {
        let frame = load_price_data(path, opts)?;
        info!(path = %path.display(), rows = frame.len(), "Loaded price data.");
        return Ok(LoadedPrices {
            frame,
            source: DataSource::File(path.to_path_buf()),
        });
    }

    warn!(?candidates, "No price data file found, generating synthetic prices.");
    let frame = synthetic::generate_price_frame(synthetic_config, price_column);
    let frame = restrict_range(frame, opts)?;
    Ok(LoadedPrices {
        frame: resample_last(&frame, opts.frequency),
        source: DataSource::Synthetic,
    })
}

/// Loads events from the first existing candidate, or returns the built-in
/// sample events when none exists.
pub fn load_events_with_fallback(candidates: &[PathBuf]) -> Result<LoadedEvents, LoadError> {
    if let Some(path) = first_existing(candidates) {
        let events = load_event_data(path)?;
        info!(path = %path.display(), events = events.len(), "Loaded event data.");
        return Ok(LoadedEvents {
            events,
            source: DataSource::File(path.to_path_buf()),
        });
    }

    warn!(?candidates, "No event data file found, using sample events.");
    Ok(LoadedEvents {
        events: synthetic::sample_events(),
        source: DataSource::Synthetic,
    })
}

/// Reads a price CSV into a date-indexed frame.
///
/// The date column (first column unless `opts.date_column` names another)
/// becomes the index; every other column whose non-missing cells all parse
/// as numbers becomes a frame column. Rows are sorted by date and for
/// duplicate dates the last row in the file wins.
pub fn load_price_data(path: &Path, opts: &PriceLoadOptions) -> Result<PriceFrame, LoadError> {
    let (headers, records) = read_csv(path)?;

    let date_idx = match &opts.date_column {
        Some(name) => {
            let wanted = normalize_header(name);
            headers.iter().position(|h| *h == wanted).ok_or_else(|| LoadError::MissingColumns {
                path: path.to_path_buf(),
                columns: vec![wanted],
            })?
        }
        None => 0,
    };

    let mut rows: Vec<(NaiveDate, &csv::StringRecord)> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let raw = record.get(date_idx).unwrap_or_default();
        let date = parse_date_flexible(raw).ok_or_else(|| LoadError::InvalidDate {
            path: path.to_path_buf(),
            // +1 for the header line, +1 for one-based numbering.
            line: i + 2,
            value: raw.to_string(),
        })?;
        rows.push((date, record));
    }

    // Stable sort keeps file order among equal dates, so the last one wins below.
    rows.sort_by_key(|(date, _)| *date);
    let before = rows.len();
    let mut deduped: Vec<(NaiveDate, &csv::StringRecord)> = Vec::with_capacity(rows.len());
    for row in rows {
        match deduped.last_mut() {
            Some(last) if last.0 == row.0 => *last = row,
            _ => deduped.push(row),
        }
    }
    if deduped.len() < before {
        warn!(
            path = %path.display(),
            duplicates = before - deduped.len(),
            "Duplicate dates in price file, keeping the last row for each."
        );
    }

    let mut columns = Vec::new();
    for (col_idx, name) in headers.iter().enumerate() {
        if col_idx == date_idx {
            continue;
        }
        let parsed: Option<Vec<Option<f64>>> = deduped
            .iter()
            .map(|(_, record)| parse_cell(record.get(col_idx).unwrap_or_default()))
            .collect();
        match parsed {
            Some(values) => columns.push(Column::new(name.clone(), values)),
            None => debug!(column = %name, "Skipping non-numeric column."),
        }
    }
    if columns.is_empty() {
        return Err(LoadError::NoNumericColumns(path.to_path_buf()));
    }

    let dates = deduped.iter().map(|(date, _)| *date).collect();
    let frame = PriceFrame::new(dates, columns)?;
    let frame = restrict_range(frame, opts)?;
    let frame = resample_last(&frame, opts.frequency);

    info!(observations = frame.len(), "Successfully loaded price observations.");
    Ok(frame)
}

/// Reads an event CSV. `event_date` is required; blank or unparseable dates
/// are kept as `None` so the row still reaches the caller.
pub fn load_event_data(path: &Path) -> Result<Vec<Event>, LoadError> {
    let (headers, records) = read_csv(path)?;

    let date_idx = headers
        .iter()
        .position(|h| h == EVENT_DATE_COLUMN)
        .ok_or_else(|| LoadError::MissingColumns {
            path: path.to_path_buf(),
            columns: vec![EVENT_DATE_COLUMN.to_string()],
        })?;

    let mut events = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let mut event = Event::default();
        for (col_idx, name) in headers.iter().enumerate() {
            let value = record.get(col_idx).unwrap_or_default();
            if col_idx == date_idx {
                event.event_date = parse_date_flexible(value);
                if event.event_date.is_none() {
                    warn!(line = i + 2, value, "Event has no valid event_date.");
                }
                continue;
            }
            if value.is_empty() {
                continue;
            }
            let value = value.to_string();
            match name.as_str() {
                "event_type" => event.event_type = Some(value),
                "impact_type" => event.impact_type = Some(value),
                "severity" => event.severity = Some(value),
                "description" | "event_description" => event.description = Some(value),
                _ => {
                    event.extra.insert(name.clone(), value);
                }
            }
        }
        events.push(event);
    }

    info!(events = events.len(), "Successfully loaded events.");
    Ok(events)
}

/// Reads the normalized header row and all records. Fails on missing or
/// empty files and on malformed CSV.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>), LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let metadata = std::fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() == 0 {
        return Err(LoadError::EmptyFile(path.to_path_buf()));
    }

    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(normalize_header).collect();
    let records = reader.records().collect::<Result<Vec<_>, _>>().map_err(csv_err)?;

    if headers.iter().all(String::is_empty) || records.is_empty() {
        return Err(LoadError::EmptyFile(path.to_path_buf()));
    }
    Ok((headers, records))
}

fn restrict_range(frame: PriceFrame, opts: &PriceLoadOptions) -> Result<PriceFrame, LoadError> {
    if let (Some(start), Some(end)) = (opts.start_date, opts.end_date) {
        if start > end {
            return Err(LoadError::InvalidRange { start, end });
        }
    }
    if opts.start_date.is_none() && opts.end_date.is_none() {
        return Ok(frame);
    }
    let filtered = frame.filter_by_date(opts.start_date, opts.end_date);
    if filtered.is_empty() {
        return Err(LoadError::EmptyAfterFilter);
    }
    Ok(filtered)
}

/// `" Close Price "` -> `"close_price"`.
fn normalize_header(raw: &str) -> String {
    raw.trim().split_whitespace().collect::<Vec<_>>().join("_").to_lowercase()
}

/// `Some(None)` for a missing cell, `None` when the cell is not numeric.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    if MISSING_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        return Some(None);
    }
    raw.parse::<f64>().ok().map(|v| v.is_finite().then_some(v))
}
