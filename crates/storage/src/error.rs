//! Storage Error Types
//!
//! Backends report failures in terms of what the caller can do about them:
//! a missing file can be re-fetched, a rejected path is a bug in the caller,
//! and I/O trouble may go away on the next attempt.

use derive_more::{Display, Error};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("no such file: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("access denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Anything else the operating system complained about.
    #[display("I/O failure: {_0}")]
    Io(IoError),
    /// Escapes the storage root, or is empty once normalized.
    #[display("path rejected: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The backend refused the operation for its own reasons.
    #[display("operation refused: {_0}")]
    Refused(#[error(not(source))] String),
}
impl ErrorKind {
    /// Classify an I/O error that happened while working on `path`.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            IoErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            IoErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Refused(_))
    }
}
