//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Any of these aborts the archive being built; nothing is left on storage.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider could not deliver a page.
    #[display("failed to fetch from provider")]
    Provider,
    /// A page could not be processed into a usable image.
    #[display("page {_0} could not be processed")]
    Processing(#[error(not(source))] u32),
    /// The provider numbered a page outside `1..`; page `000` is the preview.
    #[display("invalid page number {_0}")]
    InvalidPage(#[error(not(source))] u32),
    /// The series preview is not a usable image.
    #[display("series preview image is unusable")]
    Preview,
    /// The same entry was staged twice.
    #[display("duplicate archive entry: {_0}")]
    DuplicateEntry(#[error(not(source))] String),
    /// Building the archive bytes failed.
    #[display("failed to encode archive")]
    Encode,
    /// Writing the archive to storage failed.
    #[display("failed to store archive")]
    Storage,
    /// A background task panicked or was cancelled.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider | Self::Storage | Self::Task)
    }
}
