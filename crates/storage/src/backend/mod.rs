//! Storage backend trait and implementations.
//!
//! The engine only ever talks to storage through [`StorageBackend`], which
//! keeps archive staging and catalog persistence testable against the
//! in-memory backend.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::partial_sibling;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;
use tracing::warn;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All paths are relative to the storage root and are validated with
/// [`validate_path`](crate::validate_path) by every implementation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelf_storage::{backend::StorageBackend, error::Result};
///
/// async fn archive_size(backend: &dyn StorageBackend) -> Result<u64> {
///     let path = Path::new("Series/Series #001.cbz");
///     match backend.exists(path).await? {
///         true => Ok(backend.stat(path).await?.size),
///         false => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Shows up in logs.
    fn name(&self) -> &str;

    /// [`list_stream()`](Self::list_stream), collected.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Every committed file below `prefix` (or the whole root), in no
    /// particular order.
    ///
    /// Prefixes match whole path components, so `Series` matches
    /// `Series/Series #001.cbz` but not `Series 2/Series 2 #001.cbz`. A prefix
    /// that does not exist yields nothing. Files still being staged by
    /// [`write_atomic()`](Self::write_atomic) are never listed.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or replace a file, along with any missing parent directories.
    ///
    /// Not atomic; archives and the catalog go through
    /// [`write_atomic()`](Self::write_atomic).
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Move a file, replacing whatever is at `to`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    /// file does not exist.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    async fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// Write a file so that it is either fully present under `path` or not
    /// changed at all.
    ///
    /// Data is written to a hidden sibling (see
    /// [`partial_sibling`](crate::partial_sibling)) and renamed into place.
    /// On failure the sibling is removed on a best-effort basis.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let partial = partial_sibling(path);
        let result = match self.write(&partial, data).await {
            Ok(()) => self.rename(&partial, path).await,
            Err(e) => Err(e),
        };
        if result.is_err()
            && let Err(e) = self.delete(&partial).await
            && !matches!(&*e, ErrorKind::NotFound(_))
        {
            warn!(backend = self.name(), path = %partial.display(), error = %e, "could not remove partial file");
        }
        result
    }
}
