use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Column '{column}' has {actual} values but the index has {expected} dates")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {name} format '{value}'. Expected YYYY-MM-DD format")]
    InvalidDate { name: String, value: String },

    #[error("Invalid fill policy '{0}'. Must be one of: forward_fill, backward_fill, interpolate, drop")]
    UnknownFillPolicy(String),

    #[error("Invalid frequency '{0}'. Must be 'D', 'W', or 'M'")]
    UnknownFrequency(String),
}
