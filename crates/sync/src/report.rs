use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// A chapter whose archive transaction failed. Nothing was recorded for it,
/// so the next run tries again.
#[derive(Debug)]
pub struct ChapterFailure {
    pub address: String,
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of synchronizing one series.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub title: String,
    /// Archives written during this run.
    pub downloaded: Vec<PathBuf>,
    /// Archives that already existed and were recorded without fetching.
    pub adopted: Vec<PathBuf>,
    /// Archives a dry run would have written.
    pub planned: Vec<PathBuf>,
    /// Missing chapters rejected by the chapter filter.
    pub filtered: usize,
    /// Further releases of a chapter that already has an archive (or is
    /// about to get one), typically from another group.
    pub duplicates: usize,
    /// Chapters without a number.
    pub not_downloadable: usize,
    /// Recorded chapters the provider no longer lists.
    pub removed_upstream: usize,
    /// Orphaned archives, by their new name.
    pub orphaned: Vec<PathBuf>,
    pub failed: Vec<ChapterFailure>,
    pub elapsed: Duration,
}
impl SyncReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn chapter failures into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(Error::from(ErrorKind::Incomplete(self.failed.len())))
        }
    }
}

/// `(hh:mm:ss)`, hours unbounded.
pub fn pretty_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("({:02}:{:02}:{:02})", seconds / 3600, seconds / 60 % 60, seconds % 60)
}
