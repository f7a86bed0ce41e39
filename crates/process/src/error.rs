//! Processing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A processing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is fatal to the page being processed, and therefore to the
/// archive the page belongs to.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not an image in any supported format.
    #[display("unsupported or unrecognized image format")]
    UnsupportedFormat,
    /// The image header was recognized but the data could not be decoded.
    #[display("failed to decode image")]
    Decode,
    /// The processed image could not be encoded again.
    #[display("failed to encode image")]
    Encode,
    /// A processor produced nothing for a page.
    #[display("processor '{_0}' produced no output")]
    NoOutput(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Same bytes in, same failure out.
        false
    }
}
