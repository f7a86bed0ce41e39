//! Provider Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Adapters must keep transient failures ([`Network`](Self::Network)) apart
/// from permanent ones so that callers know whether trying again is useful.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The address does not point at anything this provider can read.
    #[display("invalid address: {_0}")]
    InvalidAddress(#[error(not(source))] String),
    /// No registered provider handles the address.
    #[display("no provider for address: {_0}")]
    Unsupported(#[error(not(source))] String),
    /// The remote content is missing a required field or has an
    /// unexpected structure.
    #[display("malformed remote content: {_0}")]
    Malformed(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
