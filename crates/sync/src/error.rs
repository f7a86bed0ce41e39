//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A synchronization error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a synchronization failure.
///
/// ### Series-level Errors
/// Abort the whole series:
/// - [`ErrorKind::Provider`]
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Storage`]
///
/// ### Batch Errors
/// Wrap a series-level error when many series run together:
/// - [`ErrorKind::Series`]
///
/// ### Chapter-level Errors
/// Collected in the [`SyncReport`](crate::SyncReport); the run continues:
/// - [`ErrorKind::Archive`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No registered provider handles the address, or the provider failed to
    /// describe the series or its pages.
    #[display("provider error")]
    Provider,
    /// Reading or updating the catalog failed.
    #[display("catalog error")]
    Catalog,
    /// Listing or renaming archives failed.
    #[display("storage error")]
    Storage,
    /// A chapter's archive transaction failed and was rolled back.
    #[display("archive transaction failed")]
    Archive,
    /// Synchronizing the series at this address failed.
    #[display("could not synchronize {_0}")]
    Series(#[error(not(source))] String),
    /// The filter configuration cannot be used.
    #[display("invalid chapter filter: {_0}")]
    InvalidFilter(#[error(not(source))] String),
    /// Some chapters failed; they will be retried on the next run.
    #[display("{_0} chapter(s) failed")]
    Incomplete(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Archive | Self::Incomplete(_))
    }
}
