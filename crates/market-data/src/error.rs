use chrono::NaiveDate;
use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems with a data file. These abort the load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("File is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Missing required columns in {path}: {columns:?}")]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Failed to parse date '{value}' on line {line} of {path}")]
    InvalidDate {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("No numeric price column found in {0}")]
    NoNumericColumns(PathBuf),

    #[error("start_date ({start}) must be less than or equal to end_date ({end})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("No data remaining after date filtering")]
    EmptyAfterFilter,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Data validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Data quality failures raised by validation and preprocessing.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} is empty")]
    Empty(String),

    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("DataFrame is empty after preprocessing with '{0}'")]
    EmptyAfterPreprocessing(String),
}
