use exn::{OptionExt, ResultExt};
use shelf_archive::Packager;
use shelf_catalog::{Repository, SeriesId};
use shelf_config::Config;
use shelf_metadata::models::{Chapter, Series};
use shelf_metadata::naming::{NamingOptions, chapter_path, series_directory};
use shelf_process::ProcessorChain;
use shelf_provider::{Provider, Registry};
use shelf_storage::BackendHandle;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use time::UtcDateTime;
use tracing::{debug, info, instrument, warn};

use crate::error::{ErrorKind, Result};
use crate::filter::ChapterFilter;
use crate::report::{ChapterFailure, SyncReport, pretty_elapsed};

/// Appended to archives that no chapter accounts for any more.
pub const ORPHAN_SUFFIX: &str = ".orphaned";

/// Brings the archives on storage in line with what providers publish.
///
/// Chapters of one series are handled one after another, in reading order.
/// The catalog is only touched after a chapter's archive has been committed,
/// so a failed chapter is simply attempted again on the next run.
pub struct Synchronizer {
    pub(crate) backend: BackendHandle,
    pub(crate) repository: Repository,
    pub(crate) registry: Registry,
    pub(crate) chain: ProcessorChain,
    pub(crate) naming: NamingOptions,
    pub(crate) filter: ChapterFilter,
    pub(crate) user: String,
    pub(crate) cleanup: bool,
    pub(crate) page_concurrency: usize,
    pub(crate) series_concurrency: usize,
}
impl Synchronizer {
    /// Whether the run is dry follows the repository.
    pub fn new(backend: BackendHandle, repository: Repository, registry: Registry) -> Self {
        Self {
            backend,
            repository,
            registry,
            chain: ProcessorChain::standard(true),
            naming: NamingOptions::default(),
            filter: ChapterFilter::default(),
            user: shelf_config::DEFAULT_USER.to_string(),
            cleanup: true,
            page_concurrency: shelf_config::DEFAULT_PAGE_CONCURRENCY,
            series_concurrency: shelf_config::DEFAULT_SERIES_CONCURRENCY,
        }
    }

    /// Open the catalog named by `config` on `backend` and apply the rest of
    /// the configuration.
    pub async fn open(config: &Config, backend: BackendHandle, registry: Registry) -> Result<Self> {
        let repository = Repository::open(backend.clone(), config.catalog_path.clone(), config.dry_run)
            .await
            .or_raise(|| ErrorKind::Catalog)?;
        Ok(Self::new(backend, repository, registry)
            .with_chain(ProcessorChain::standard(config.processors.footer))
            .with_naming(config.naming_options())
            .with_filter(ChapterFilter::from_settings(&config.filter)?)
            .with_user(&config.user)
            .with_cleanup(config.cleanup)
            .with_page_concurrency(config.page_concurrency)
            .with_series_concurrency(config.series_concurrency))
    }

    pub fn with_chain(mut self, chain: ProcessorChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_naming(mut self, naming: NamingOptions) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_filter(mut self, filter: ChapterFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_page_concurrency(mut self, concurrency: usize) -> Self {
        self.page_concurrency = concurrency.max(1);
        self
    }

    pub fn with_series_concurrency(mut self, concurrency: usize) -> Self {
        self.series_concurrency = concurrency.max(1);
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Synchronize the series at `address` with whichever registered provider
    /// handles it.
    pub async fn sync(&self, address: &str) -> Result<SyncReport> {
        let provider = self.registry.open(address).or_raise(|| ErrorKind::Provider)?;
        self.sync_series(provider.as_ref(), address).await
    }

    /// Synchronize one series.
    ///
    /// Failing to describe the series aborts it. Failing chapters are
    /// collected in the report instead; see [`SyncReport::into_result`].
    #[instrument(skip_all, fields(provider = provider.name(), address = address))]
    pub async fn sync_series(&self, provider: &dyn Provider, address: &str) -> Result<SyncReport> {
        let started = Instant::now();
        let series = provider.resolve_series(address).await.or_raise(|| ErrorKind::Provider)?.into_chronological();
        info!("Fetching {}", series.title);
        match self.reconcile(provider, address, &series).await {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                if report.is_complete() {
                    info!("Finished {} {}", series.title, pretty_elapsed(report.elapsed));
                } else {
                    warn!(failed = report.failed.len(), "Canceled {} {}", series.title, pretty_elapsed(report.elapsed));
                }
                Ok(report)
            },
            Err(e) => {
                warn!(error = %e, "Canceled {} {}", series.title, pretty_elapsed(started.elapsed()));
                Err(e)
            },
        }
    }

    async fn reconcile(&self, provider: &dyn Provider, address: &str, series: &Series) -> Result<SyncReport> {
        let dry_run = self.repository.is_dry_run();
        let id = self
            .repository
            .upsert_series(provider.name(), address, series, &self.user, UtcDateTime::now())
            .await
            .or_raise(|| ErrorKind::Catalog)?;
        let on_disk = self.archives_on_disk(&series.title).await?;
        let diff = self.repository.diff(id, series, &on_disk, self.naming).await.or_raise(|| ErrorKind::Catalog)?;

        let mut report = SyncReport::new(&series.title);
        report.not_downloadable = diff.not_downloadable.len();
        report.duplicates = diff.duplicates.len();
        for chapter in &diff.duplicates {
            debug!(address = %chapter.address, group = ?chapter.group, "another release already claims this archive");
        }
        report.removed_upstream = diff.removed_upstream.len();
        if report.removed_upstream > 0 {
            debug!(count = report.removed_upstream, "recorded chapters no longer listed upstream");
        }

        for chapter in &diff.to_adopt {
            let Some(path) = self.archive_path(series, chapter) else {
                continue;
            };
            self.repository
                .record_success(id, chapter, UtcDateTime::now())
                .await
                .or_raise(|| ErrorKind::Catalog)?;
            debug!(path = %path.display(), "adopted existing archive");
            report.adopted.push(path);
        }

        let pending: Vec<(&Chapter, PathBuf)> = diff
            .to_download
            .iter()
            .filter(|chapter| self.filter.passes(chapter))
            .filter_map(|chapter| Some((chapter, self.archive_path(series, chapter)?)))
            .collect();
        report.filtered = diff.to_download.len() - pending.len();

        if dry_run {
            for (_, path) in pending {
                info!("Fetching {} (dry run)", display_name(&path));
                report.planned.push(path);
            }
            return Ok(report);
        }

        if !pending.is_empty() {
            let preview = provider.fetch_preview(address).await.or_raise(|| ErrorKind::Provider)?;
            let packager = Packager::new(&self.backend, provider, &self.chain).with_concurrency(self.page_concurrency);
            for (chapter, path) in pending {
                let name = display_name(&path);
                let started = Instant::now();
                info!("Fetching {name}");
                match self.transaction(&packager, provider, series, chapter, &preview, &path).await {
                    Ok(()) => {
                        self.repository
                            .record_success(id, chapter, UtcDateTime::now())
                            .await
                            .or_raise(|| ErrorKind::Catalog)?;
                        info!("Finished {name} {}", pretty_elapsed(started.elapsed()));
                        report.downloaded.push(path);
                    },
                    Err(error) => {
                        warn!(%error, "Canceled {name} {}", pretty_elapsed(started.elapsed()));
                        report.failed.push(ChapterFailure {
                            address: chapter.address.clone(),
                            path,
                            error,
                        });
                    },
                }
            }
        }

        if self.cleanup {
            report.orphaned = self.rename_orphans(&diff.to_delete_from_disk).await?;
        }
        Ok(report)
    }

    async fn transaction(
        &self,
        packager: &Packager<'_>,
        provider: &dyn Provider,
        series: &Series,
        chapter: &Chapter,
        preview: &[u8],
        path: &Path,
    ) -> Result<()> {
        let pages = provider.pages(chapter).await.or_raise(|| ErrorKind::Provider)?;
        packager.create_archive(series, chapter, &pages, preview, path).await.or_raise(|| ErrorKind::Archive)?;
        Ok(())
    }

    /// Rename the archives of a recorded series that no recorded chapter
    /// accounts for. Returns their new paths.
    ///
    /// A dry run only logs what would be renamed.
    pub async fn cleanup(&self, id: SeriesId) -> Result<Vec<PathBuf>> {
        let entry = self.repository.series(id).await.ok_or_raise(|| ErrorKind::Catalog)?;
        let on_disk = self.archives_on_disk(&entry.metadata.title).await?;
        // Without upstream chapters, everything the catalog does not imply is
        // an orphan.
        let diff = self
            .repository
            .diff(id, &entry.metadata, &on_disk, self.naming)
            .await
            .or_raise(|| ErrorKind::Catalog)?;
        if self.repository.is_dry_run() {
            for path in &diff.to_delete_from_disk {
                info!(path = %path.display(), "would mark archive as orphaned (dry run)");
            }
            return Ok(Vec::new());
        }
        self.rename_orphans(&diff.to_delete_from_disk).await
    }

    async fn rename_orphans(&self, orphans: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut renamed = Vec::with_capacity(orphans.len());
        for path in orphans {
            let mut target = OsString::from(path.as_os_str());
            target.push(ORPHAN_SUFFIX);
            let target = PathBuf::from(target);
            self.backend.rename(path, &target).await.or_raise(|| ErrorKind::Storage)?;
            debug!(from = %path.display(), to = %target.display(), "marked archive as orphaned");
            renamed.push(target);
        }
        Ok(renamed)
    }

    async fn archives_on_disk(&self, title: &str) -> Result<Vec<PathBuf>> {
        let Some(directory) = series_directory(title) else {
            return Ok(Vec::new());
        };
        let files = self.backend.list(Some(Path::new(&directory))).await.or_raise(|| ErrorKind::Storage)?;
        Ok(files.into_iter().map(|file| file.path).collect())
    }

    fn archive_path(&self, series: &Series, chapter: &Chapter) -> Option<PathBuf> {
        chapter_path(&series.title, chapter, self.naming)
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem().unwrap_or(path.as_os_str()).to_string_lossy().into_owned()
}
