use async_trait::async_trait;
use shelf_metadata::models::{Chapter, Series};

use crate::error::Result;

/// One page of a chapter, as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    /// Starts at 1
    pub number: u32,
    /// Source-specific address of the page image
    pub address: String,
}
impl Page {
    pub fn new(number: u32, address: impl Into<String>) -> Self {
        Self {
            number,
            address: address.into(),
        }
    }
}

/// A remote source of series, chapters and page images.
///
/// Implementations own everything site-specific (markup selection, login,
/// HTTP retries); the engine only sees normalized [`Series`] and raw page
/// bytes.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable name, used as the catalog key for this provider.
    fn name(&self) -> &str;

    /// Whether `address` belongs to this provider.
    fn handles(&self, address: &str) -> bool;

    /// Describe the series at `address`.
    ///
    /// Chapters are returned in source page order (newest first), exactly as
    /// scraped.
    async fn resolve_series(&self, address: &str) -> Result<Series>;

    /// Fetch the series preview (cover) image.
    async fn fetch_preview(&self, address: &str) -> Result<Vec<u8>>;

    /// List the pages of a chapter.
    async fn pages(&self, chapter: &Chapter) -> Result<Vec<Page>>;

    /// Fetch the raw image bytes of a page.
    async fn fetch_page(&self, chapter: &Chapter, page: &Page) -> Result<Vec<u8>>;

    /// Whether pages from this provider should go through the named
    /// processor. Providers opt out of processors their pages do not need.
    fn accepts_processor(&self, _name: &str) -> bool {
        true
    }
}
