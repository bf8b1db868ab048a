//! # Core Types
//!
//! The shared vocabulary of the workspace: the date-indexed price table, the
//! market event record and its aligned counterpart, plus the small enums and
//! helpers every other crate needs.
//!
//! This is a Layer 0 crate. It knows nothing about files, HTTP or statistics
//! beyond the handful of numeric summaries in [`numeric`].

pub mod dates;
pub mod enums;
pub mod error;
pub mod numeric;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{DataSource, FillPolicy, Frequency};
pub use error::CoreError;
pub use structs::{AlignedEvent, Column, Event, ImpactMetrics, PriceFrame, PriceSample};
