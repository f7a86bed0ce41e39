use derive_more::Display;
use shelf_metadata::models::{Chapter, Series};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::UtcDateTime;

/// Stable surrogate key of a series. Assigned once, never reused.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesId(pub u64);

/// Stable surrogate key of a chapter. Assigned once, never reused.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterId(pub u64);

/// A series tracked for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub id: SeriesId,
    /// Provider name
    pub provider: String,
    /// Source address within the provider
    pub address: String,
    /// Latest description from the provider, without chapters
    pub metadata: Series,
    /// When each user added the series
    pub added_at: BTreeMap<String, UtcDateTime>,
    /// Last successful resolution against the provider
    pub checked_at: Option<UtcDateTime>,
    /// Chapter index, keyed by source address
    pub chapters: BTreeMap<String, ChapterId>,
}

/// A chapter whose archive has been acquired.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterEntry {
    pub id: ChapterId,
    pub series: SeriesId,
    /// Chapter metadata as it was when the archive was written
    pub chapter: Chapter,
    pub added_at: UtcDateTime,
    /// When each user last read the chapter
    pub read_at: BTreeMap<String, UtcDateTime>,
}

/// What needs to happen to bring storage in line with a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    /// Chapters with no archive on storage, in chronological order.
    pub to_download: Vec<Chapter>,
    /// Chapters whose archive already exists but which the catalog does not
    /// know about yet. They are recorded without fetching anything.
    pub to_adopt: Vec<Chapter>,
    /// Further releases of a chapter whose archive path another chapter
    /// already claims. Never fetched, so a committed archive is never
    /// replaced.
    pub duplicates: Vec<Chapter>,
    /// Chapters without a number; they never get an archive.
    pub not_downloadable: Vec<Chapter>,
    /// Recorded chapters the provider no longer lists. Reported only; the
    /// catalog keeps them until the series is removed.
    pub removed_upstream: Vec<ChapterId>,
    /// Archives on storage that no recorded (or adopted) chapter accounts
    /// for.
    pub to_delete_from_disk: Vec<PathBuf>,
}

/// A user's view of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub id: SeriesId,
    pub provider: String,
    pub address: String,
    pub metadata: Series,
    pub added_at: UtcDateTime,
    pub checked_at: Option<UtcDateTime>,
    pub chapter_count: usize,
    pub read_count: usize,
    /// Most recently acquired chapter
    pub last_added_at: Option<UtcDateTime>,
    /// Most recent read by this user
    pub last_read_at: Option<UtcDateTime>,
}
