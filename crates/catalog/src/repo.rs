use exn::{OptionExt, ResultExt};
use shelf_metadata::models::{Chapter, Series};
use shelf_metadata::naming::NamingOptions;
use shelf_storage::BackendHandle;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::document::{decode, encode};
use crate::error::{ErrorKind, Result};
use crate::models::{ChapterEntry, ChapterId, Diff, SeriesEntry, SeriesId, SeriesSummary};

/// Durable catalog.
///
/// Every mutation is applied to a copy of the catalog, written through to
/// storage, and only then made visible. A failed write leaves both the stored
/// document and the in-memory state untouched. In dry-run mode nothing is
/// written, but mutations still take effect in memory so that a dry run
/// reports what a real run would do.
pub struct Repository {
    backend: BackendHandle,
    path: PathBuf,
    dry_run: bool,
    catalog: Mutex<Catalog>,
}
impl Repository {
    /// Load the catalog document at `path`, or start empty if there is none.
    pub async fn open(backend: BackendHandle, path: impl Into<PathBuf>, dry_run: bool) -> Result<Self> {
        let path = path.into();
        let exists = backend.exists(&path).await.or_raise(|| ErrorKind::Storage)?;
        let catalog = if exists {
            let bytes = backend.read(&path).await.or_raise(|| ErrorKind::Storage)?;
            decode(&bytes)?
        } else {
            debug!(path = %path.display(), "no catalog document yet, starting empty");
            Catalog::default()
        };
        info!(
            path = %path.display(),
            series = catalog.series.len(),
            chapters = catalog.chapters.len(),
            dry_run,
            "opened catalog"
        );
        Ok(Self {
            backend,
            path,
            dry_run,
            catalog: Mutex::new(catalog),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Point-in-time copy of the whole catalog.
    pub async fn snapshot(&self) -> Catalog {
        self.catalog.lock().await.clone()
    }

    async fn mutate<T>(&self, change: impl FnOnce(&mut Catalog) -> Result<T>) -> Result<T> {
        let mut guard = self.catalog.lock().await;
        let mut next = guard.clone();
        let value = change(&mut next)?;
        if next == *guard {
            return Ok(value);
        }
        if !self.dry_run {
            let bytes = encode(&next)?;
            self.backend.write_atomic(&self.path, &bytes).await.or_raise(|| ErrorKind::Storage)?;
        }
        *guard = next;
        Ok(value)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find(&self, provider: &str, address: &str) -> Option<SeriesId> {
        self.catalog.lock().await.find(provider, address)
    }

    pub async fn series(&self, id: SeriesId) -> Option<SeriesEntry> {
        self.catalog.lock().await.series(id).cloned()
    }

    pub async fn chapters(&self, id: SeriesId) -> Vec<ChapterEntry> {
        self.catalog.lock().await.chapters(id).into_iter().cloned().collect()
    }

    pub async fn expected_archives(&self, id: SeriesId, naming: NamingOptions) -> BTreeSet<PathBuf> {
        self.catalog.lock().await.expected_archives(id, naming)
    }

    pub async fn view(&self, user: &str) -> Vec<SeriesSummary> {
        self.catalog.lock().await.view(user)
    }

    pub async fn diff(&self, id: SeriesId, upstream: &Series, on_disk: &[PathBuf], naming: NamingOptions) -> Result<Diff> {
        self.catalog
            .lock()
            .await
            .diff(id, upstream, on_disk, naming)
            .ok_or_raise(|| ErrorKind::UnknownSeries(id.0))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn upsert_series(
        &self,
        provider: &str,
        address: &str,
        series: &Series,
        user: &str,
        now: UtcDateTime,
    ) -> Result<SeriesId> {
        self.mutate(|catalog| Ok(catalog.upsert_series(provider, address, series, user, now))).await
    }

    pub async fn record_success(&self, series: SeriesId, chapter: &Chapter, now: UtcDateTime) -> Result<ChapterId> {
        self.mutate(|catalog| {
            catalog
                .record_success(series, chapter, now)
                .ok_or_raise(|| ErrorKind::UnknownSeries(series.0))
        })
        .await
    }

    pub async fn remove_series(&self, id: SeriesId) -> Result<bool> {
        self.mutate(|catalog| Ok(catalog.remove_series(id))).await
    }

    pub async fn mark_read(&self, user: &str, chapter: ChapterId, now: UtcDateTime) -> Result<bool> {
        self.mutate(|catalog| Ok(catalog.mark_read(user, chapter, now))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_storage::StorageBackend;
    use shelf_storage::backend::MockBackend;
    use std::sync::Arc;
    use time::macros::datetime;

    const CATALOG: &str = "catalog.json";

    fn now() -> UtcDateTime {
        datetime!(2016-03-13 12:00 UTC).to_utc()
    }

    fn upstream() -> Series {
        Series::new("Series").with_chapters([Chapter::new("c1").with_number(1.0), Chapter::new("c2").with_number(2.0)])
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let repo = Repository::open(backend.clone(), CATALOG, false).await.unwrap();
        let id = repo.upsert_series("mock", "s", &upstream(), "alice", now()).await.unwrap();
        let chapter = repo.record_success(id, &upstream().chapters[0], now()).await.unwrap();
        repo.mark_read("alice", chapter, now()).await.unwrap();

        let reopened = Repository::open(backend, CATALOG, false).await.unwrap();
        assert_eq!(reopened.snapshot().await, repo.snapshot().await);
        assert_eq!(reopened.find("mock", "s").await, Some(id));
        assert_eq!(reopened.view("alice").await[0].read_count, 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let mock = Arc::new(MockBackend::default());
        let backend: BackendHandle = mock.clone();
        let repo = Repository::open(backend, CATALOG, true).await.unwrap();
        let id = repo.upsert_series("mock", "s", &upstream(), "alice", now()).await.unwrap();
        repo.record_success(id, &upstream().chapters[0], now()).await.unwrap();
        assert_eq!(repo.chapters(id).await.len(), 1);
        assert!(mock.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_state_unchanged() {
        let mock = Arc::new(MockBackend::default().failing_on(CATALOG));
        let backend: BackendHandle = mock.clone();
        let repo = Repository::open(backend, CATALOG, false).await.unwrap();
        let err = repo.upsert_series("mock", "s", &upstream(), "alice", now()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert!(err.is_retryable());
        assert_eq!(repo.snapshot().await, Catalog::default());
        assert!(mock.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_series() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let repo = Repository::open(backend, CATALOG, false).await.unwrap();
        let err = repo.record_success(SeriesId(3), &upstream().chapters[0], now()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownSeries(3));
        let err = repo.diff(SeriesId(3), &upstream(), &[], NamingOptions::default()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownSeries(3));
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_document() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([(CATALOG, b"{".to_vec())]));
        let err = Repository::open(backend.clone(), CATALOG, false).await.err().unwrap();
        assert_eq!(*err, ErrorKind::Serialization);
        assert!(backend.exists(Path::new(CATALOG)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unchanged_catalog_is_not_rewritten() {
        let mock = Arc::new(MockBackend::default());
        let backend: BackendHandle = mock.clone();
        let repo = Repository::open(backend, CATALOG, false).await.unwrap();
        assert!(!repo.mark_read("alice", ChapterId(1), now()).await.unwrap());
        assert!(mock.paths().await.is_empty());
    }
}
