//! In-memory provider for testing.

use async_trait::async_trait;
use exn::OptionExt;
use shelf_metadata::models::{Chapter, Series};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, Result};
use crate::provider::{Page, Provider};

/// In-memory [`Provider`] for testing.
///
/// Serves canned series and page bytes, records every page fetch, and can be
/// told to fail or delay specific pages.
///
/// # Examples
///
/// ```
/// use shelf_metadata::models::{Chapter, Series};
/// use shelf_provider::{MockProvider, Provider};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new("mock")
///     .with_series("mock://series", Series::new("Title").with_chapters([Chapter::new("mock://c1").with_number(1.0)]))
///     .with_pages("mock://c1", [b"page".to_vec()]);
/// let series = provider.resolve_series("mock://series").await.unwrap();
/// let pages = provider.pages(&series.chapters[0]).await.unwrap();
/// assert_eq!(pages.len(), 1);
/// # }
/// ```
pub struct MockProvider {
    name: String,
    series: HashMap<String, Series>,
    pages: HashMap<String, Vec<Vec<u8>>>,
    preview: Vec<u8>,
    failing: HashSet<(String, u32)>,
    delays: HashMap<u32, Duration>,
    refused: Vec<String>,
    fetched: Mutex<Vec<(String, u32)>>,
}
impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: HashMap::new(),
            pages: HashMap::new(),
            preview: Vec::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
            refused: Vec::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Serve `series` at `address`. Chapters should be listed newest first,
    /// like a real source page.
    pub fn with_series(mut self, address: impl Into<String>, series: Series) -> Self {
        self.series.insert(address.into(), series);
        self
    }

    pub fn with_pages(mut self, chapter: impl Into<String>, pages: impl IntoIterator<Item = Vec<u8>>) -> Self {
        self.pages.insert(chapter.into(), pages.into_iter().collect());
        self
    }

    pub fn with_preview(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.preview = bytes.into();
        self
    }

    /// Make fetching page `number` of `chapter` fail with a network error.
    pub fn failing_page(mut self, chapter: impl Into<String>, number: u32) -> Self {
        self.failing.insert((chapter.into(), number));
        self
    }

    /// Delay every fetch of page `number`, whatever the chapter.
    pub fn with_page_delay(mut self, number: u32, delay: Duration) -> Self {
        self.delays.insert(number, delay);
        self
    }

    /// Opt out of the named processor.
    pub fn refusing_processor(mut self, name: impl Into<String>) -> Self {
        self.refused.push(name.into());
        self
    }

    /// Every `(chapter address, page number)` fetched so far, in completion
    /// order.
    pub async fn fetched(&self) -> Vec<(String, u32)> {
        self.fetched.lock().await.clone()
    }

    /// Number of page fetches made for `chapter`.
    pub async fn fetch_count(&self, chapter: &str) -> usize {
        self.fetched.lock().await.iter().filter(|(address, _)| address == chapter).count()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self, address: &str) -> bool {
        self.series.contains_key(address)
    }

    async fn resolve_series(&self, address: &str) -> Result<Series> {
        self.series.get(address).cloned().ok_or_raise(|| ErrorKind::InvalidAddress(address.to_string()))
    }

    async fn fetch_preview(&self, address: &str) -> Result<Vec<u8>> {
        if !self.series.contains_key(address) {
            exn::bail!(ErrorKind::InvalidAddress(address.to_string()));
        }
        Ok(self.preview.clone())
    }

    async fn pages(&self, chapter: &Chapter) -> Result<Vec<Page>> {
        let pages = self.pages.get(&chapter.address).ok_or_raise(|| ErrorKind::InvalidAddress(chapter.address.clone()))?;
        Ok((1..=pages.len() as u32).map(|n| Page::new(n, format!("{}/{n}", chapter.address))).collect())
    }

    async fn fetch_page(&self, chapter: &Chapter, page: &Page) -> Result<Vec<u8>> {
        if let Some(delay) = self.delays.get(&page.number) {
            tokio::time::sleep(*delay).await;
        }
        self.fetched.lock().await.push((chapter.address.clone(), page.number));
        if self.failing.contains(&(chapter.address.clone(), page.number)) {
            exn::bail!(ErrorKind::Network(format!("induced failure fetching {}", page.address)));
        }
        let index = page.number.checked_sub(1).ok_or_raise(|| ErrorKind::InvalidAddress(page.address.clone()))?;
        self.pages
            .get(&chapter.address)
            .and_then(|pages| pages.get(index as usize))
            .cloned()
            .ok_or_raise(|| ErrorKind::InvalidAddress(page.address.clone()))
    }

    fn accepts_processor(&self, name: &str) -> bool {
        !self.refused.iter().any(|refused| refused == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MockProvider {
        let series = Series::new("Title").with_chapters([Chapter::new("c1").with_number(1.0)]);
        MockProvider::new("mock")
            .with_series("s", series)
            .with_pages("c1", [b"one".to_vec(), b"two".to_vec()])
            .failing_page("c1", 2)
            .refusing_processor("footer")
    }

    #[tokio::test]
    async fn test_fetches_are_recorded() {
        let provider = provider();
        let chapter = Chapter::new("c1");
        let pages = provider.pages(&chapter).await.unwrap();
        assert_eq!(pages, vec![Page::new(1, "c1/1"), Page::new(2, "c1/2")]);
        assert_eq!(provider.fetch_page(&chapter, &pages[0]).await.unwrap(), b"one");
        let err = provider.fetch_page(&chapter, &pages[1]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(provider.fetch_count("c1").await, 2);
    }

    #[tokio::test]
    async fn test_unknown_addresses() {
        let provider = provider();
        let err = provider.resolve_series("nope").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidAddress(_)));
        assert!(!err.is_retryable());
        assert!(!provider.handles("nope"));
        assert!(!provider.accepts_processor("footer"));
        assert!(provider.accepts_processor("other"));
    }
}
