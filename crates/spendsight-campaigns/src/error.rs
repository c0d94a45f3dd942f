//! Error Types for Campaign Tracking

use thiserror::Error;
use uuid::Uuid;

/// Rejection of a single manually entered campaign field.
///
/// Validation errors are recoverable: they surface as field-level messages
/// and never abort anything beyond the one request that carried the bad
/// input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Name empty or shorter than the minimum after trimming
    #[error("campaign name must be at least 3 characters")]
    InvalidName,

    /// Spend or revenue cell did not parse as a finite decimal
    #[error("{field} is not a valid number")]
    InvalidNumber { field: &'static str },

    /// Date missing
    #[error("date is required")]
    InvalidDate,
}

/// Failure to make sense of a CSV batch as a whole.
///
/// Malformed *cells* never produce an error on the import path (they are
/// coerced to safe defaults), so this only covers input without a usable
/// header row.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No header row at all
    #[error("csv input is empty")]
    Empty,

    /// Header row lacks one or more required columns
    #[error("csv header is missing required columns: {missing}")]
    MissingHeader { missing: String },
}

/// Campaign store failure
#[derive(Error, Debug)]
pub enum StoreError {
    /// No campaign with the given id
    #[error("campaign not found: {0}")]
    NotFound(Uuid),

    /// Backend rejected the operation
    #[error("storage backend error: {0}")]
    Backend(String),
}
