use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("{0} is empty")]
    EmptyInput(String),

    #[error("Price column '{0}' not found")]
    MissingColumn(String),

    #[error("Price index must be strictly ascending without duplicate dates")]
    UnorderedIndex,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not enough data to perform calculation: {0}")]
    InsufficientData(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
