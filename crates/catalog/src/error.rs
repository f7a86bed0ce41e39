//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or writing the catalog document failed.
    #[display("catalog storage error")]
    Storage,
    /// The catalog document could not be (de)serialized.
    #[display("catalog document is not valid JSON")]
    Serialization,
    /// The catalog document parsed, but a field holds an impossible value.
    #[display("invalid data in catalog field: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// No series with this id is recorded.
    #[display("unknown series: {_0}")]
    UnknownSeries(#[error(not(source))] u64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
