//! The archive transaction: fetch, process and package one chapter.

use exn::ResultExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use shelf_metadata::models::{Chapter, Series};
use shelf_process::{ProcessedPage, ProcessorChain, detect_format, extension};
use shelf_provider::{Page, Provider};
use shelf_storage::{BackendHandle, FileInfo};
use std::path::Path;
use tracing::{debug, instrument};

use crate::comicinfo::comic_info;
use crate::error::{ErrorKind, Result};
use crate::staged::{Slot, StagedArchive};

/// Pages fetched and processed at the same time within one chapter.
pub const DEFAULT_PAGE_CONCURRENCY: usize = 4;

/// Builds chapter archives from one provider's pages.
pub struct Packager<'a> {
    backend: &'a BackendHandle,
    provider: &'a dyn Provider,
    chain: ProcessorChain,
    concurrency: usize,
}
impl<'a> Packager<'a> {
    /// The processor chain is narrowed down to the processors `provider`
    /// accepts.
    pub fn new(backend: &'a BackendHandle, provider: &'a dyn Provider, chain: &ProcessorChain) -> Self {
        Self {
            backend,
            provider,
            chain: chain.select(|name| provider.accepts_processor(name)),
            concurrency: DEFAULT_PAGE_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch and process every page, then commit the archive to `path`
    /// together with the series preview and a `ComicInfo.xml`.
    ///
    /// All or nothing: if any page fails to fetch or process, or the commit
    /// fails, the staged entries are discarded and no archive exists at
    /// `path` afterwards.
    #[instrument(skip_all, fields(chapter = %chapter.address, pages = pages.len(), path = %path.display()))]
    pub async fn create_archive(
        &self,
        series: &Series,
        chapter: &Chapter,
        pages: &[Page],
        preview: &[u8],
        path: &Path,
    ) -> Result<FileInfo> {
        let mut archive = StagedArchive::create(self.backend.clone(), path);
        match self.stage(&mut archive, series, chapter, pages, preview).await {
            Ok(()) => archive.commit().await,
            Err(e) => {
                archive.rollback();
                Err(e)
            },
        }
    }

    async fn stage(
        &self,
        archive: &mut StagedArchive,
        series: &Series,
        chapter: &Chapter,
        pages: &[Page],
        preview: &[u8],
    ) -> Result<()> {
        if let Some(page) = pages.iter().find(|page| page.number == 0) {
            exn::bail!(ErrorKind::InvalidPage(page.number));
        }
        let mut queue: Vec<_> = pages.iter().map(|page| self.fetch_and_process(chapter, page)).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(queue.drain(..self.concurrency.min(queue.len())));
        while let Some(result) = processing.next().await {
            // Returning drops (and so cancels) whatever is still in flight.
            let (number, page) = result?;
            archive.write(Slot::Page(number), page.extension(), page.bytes)?;
            // Pop-n-push, FIFO.
            if !queue.is_empty() {
                processing.push(queue.remove(0));
            }
        }

        let preview_format = detect_format(preview).or_raise(|| ErrorKind::Preview)?;
        archive.write(Slot::Preview, extension(preview_format), preview.to_vec())?;
        let page_count = u32::try_from(pages.len()).or_raise(|| ErrorKind::Encode)?;
        archive.write(Slot::Metadata, "xml", comic_info(series, chapter, page_count).into_bytes())?;
        Ok(())
    }

    async fn fetch_and_process(&self, chapter: &Chapter, page: &Page) -> Result<(u32, ProcessedPage)> {
        let bytes = self.provider.fetch_page(chapter, page).await.or_raise(|| ErrorKind::Provider)?;
        let chain = self.chain.clone();
        let processed = tokio::task::spawn_blocking(move || chain.run(bytes))
            .await
            .or_raise(|| ErrorKind::Task)?
            .or_raise(|| ErrorKind::Processing(page.number))?;
        debug!(page = page.number, size = processed.bytes.len(), "page processed");
        Ok((page.number, processed))
    }
}
