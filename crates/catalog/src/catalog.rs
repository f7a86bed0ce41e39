//! In-memory catalog arena.
//!
//! Entities live in flat maps keyed by surrogate id; parent-child links are
//! index maps keyed by source address. Nothing here touches storage, see
//! [`Repository`](crate::Repository) for persistence.

use shelf_metadata::models::{Chapter, Series};
use shelf_metadata::naming::{NamingOptions, chapter_path, is_archive, series_directory};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use time::UtcDateTime;

use crate::models::{ChapterEntry, ChapterId, Diff, SeriesEntry, SeriesId, SeriesSummary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub(crate) next_id: u64,
    /// Provider name -> series address -> id
    pub(crate) providers: BTreeMap<String, BTreeMap<String, SeriesId>>,
    pub(crate) series: BTreeMap<SeriesId, SeriesEntry>,
    pub(crate) chapters: BTreeMap<ChapterId, ChapterEntry>,
}
impl Catalog {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn find(&self, provider: &str, address: &str) -> Option<SeriesId> {
        self.providers.get(provider)?.get(address).copied()
    }

    pub fn series(&self, id: SeriesId) -> Option<&SeriesEntry> {
        self.series.get(&id)
    }

    pub fn chapter(&self, id: ChapterId) -> Option<&ChapterEntry> {
        self.chapters.get(&id)
    }

    /// Recorded chapters of a series, ordered by number. Unnumbered chapters
    /// sort last.
    pub fn chapters(&self, id: SeriesId) -> Vec<&ChapterEntry> {
        let Some(entry) = self.series.get(&id) else {
            return Vec::new();
        };
        let mut chapters: Vec<&ChapterEntry> = entry.chapters.values().filter_map(|c| self.chapters.get(c)).collect();
        chapters.sort_by(|a, b| match (a.chapter.number, b.chapter.number) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        chapters
    }

    /// Archive paths implied by the chapters recorded for a series.
    pub fn expected_archives(&self, id: SeriesId, naming: NamingOptions) -> BTreeSet<PathBuf> {
        let Some(entry) = self.series.get(&id) else {
            return BTreeSet::new();
        };
        self.chapters(id)
            .into_iter()
            .filter_map(|c| chapter_path(&entry.metadata.title, &c.chapter, naming))
            .collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Record the latest description of a series and mark it as checked.
    ///
    /// The user's "added at" marker is only set the first time.
    pub fn upsert_series(
        &mut self,
        provider: &str,
        address: &str,
        series: &Series,
        user: &str,
        now: UtcDateTime,
    ) -> SeriesId {
        let metadata = Series {
            chapters: Vec::new(),
            ..series.clone()
        };
        let id = match self.find(provider, address) {
            Some(id) => id,
            None => {
                let id = SeriesId(self.allocate());
                self.providers.entry(provider.to_string()).or_default().insert(address.to_string(), id);
                self.series.insert(
                    id,
                    SeriesEntry {
                        id,
                        provider: provider.to_string(),
                        address: address.to_string(),
                        metadata: metadata.clone(),
                        added_at: BTreeMap::new(),
                        checked_at: None,
                        chapters: BTreeMap::new(),
                    },
                );
                id
            },
        };
        if let Some(entry) = self.series.get_mut(&id) {
            entry.metadata = metadata;
            entry.checked_at = Some(now);
            entry.added_at.entry(user.to_string()).or_insert(now);
        }
        id
    }

    /// Record that a chapter's archive exists. Returns `None` for an unknown
    /// series.
    ///
    /// Re-recording a known address keeps its id and refreshes its metadata.
    pub fn record_success(&mut self, series: SeriesId, chapter: &Chapter, now: UtcDateTime) -> Option<ChapterId> {
        let known = self.series.get(&series)?.chapters.get(&chapter.address).copied();
        let id = match known {
            Some(id) => id,
            None => ChapterId(self.allocate()),
        };
        let entry = self.chapters.entry(id).or_insert_with(|| ChapterEntry {
            id,
            series,
            chapter: chapter.clone(),
            added_at: now,
            read_at: BTreeMap::new(),
        });
        entry.chapter = chapter.clone();
        self.series.get_mut(&series)?.chapters.insert(chapter.address.clone(), id);
        Some(id)
    }

    /// Forget a series and its chapters. Archives on storage are untouched.
    pub fn remove_series(&mut self, id: SeriesId) -> bool {
        let Some(entry) = self.series.remove(&id) else {
            return false;
        };
        for chapter in entry.chapters.values() {
            self.chapters.remove(chapter);
        }
        if let Some(index) = self.providers.get_mut(&entry.provider) {
            index.remove(&entry.address);
            if index.is_empty() {
                self.providers.remove(&entry.provider);
            }
        }
        true
    }

    /// Set a user's read marker on a chapter.
    pub fn mark_read(&mut self, user: &str, chapter: ChapterId, now: UtcDateTime) -> bool {
        match self.chapters.get_mut(&chapter) {
            Some(entry) => {
                entry.read_at.insert(user.to_string(), now);
                true
            },
            None => false,
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Compare a provider's current description of a series with the catalog
    /// and with the archives found on storage for it.
    ///
    /// `on_disk` may contain any paths; only archives inside the series
    /// directory are considered. Returns `None` for an unknown series.
    pub fn diff(&self, id: SeriesId, upstream: &Series, on_disk: &[PathBuf], naming: NamingOptions) -> Option<Diff> {
        let entry = self.series.get(&id)?;
        let directory = series_directory(&upstream.title).map(PathBuf::from);
        let archives: BTreeSet<&PathBuf> = on_disk
            .iter()
            .filter(|p| is_archive(p) && directory.as_ref().is_some_and(|d| p.parent() == Some(d.as_path())))
            .collect();

        let mut diff = Diff::default();
        let mut expected = self.expected_archives(id, naming);
        let paths: Vec<(&Chapter, Option<PathBuf>)> = upstream
            .chapters
            .iter()
            .map(|chapter| (chapter, chapter_path(&upstream.title, chapter, naming)))
            .collect();
        // One archive per path: recorded chapters keep theirs, otherwise the
        // first release in reading order takes it.
        let mut claimed: BTreeSet<PathBuf> = paths
            .iter()
            .filter(|(chapter, _)| entry.chapters.contains_key(&chapter.address))
            .filter_map(|(_, path)| path.clone().filter(|p| archives.contains(p)))
            .collect();
        for (chapter, path) in paths {
            let Some(path) = path else {
                diff.not_downloadable.push(chapter.clone());
                continue;
            };
            let on_disk = archives.contains(&path);
            let recorded = entry.chapters.contains_key(&chapter.address);
            if on_disk && recorded {
                // Already claimed above.
            } else if !claimed.insert(path.clone()) {
                diff.duplicates.push(chapter.clone());
            } else if on_disk {
                diff.to_adopt.push(chapter.clone());
            } else {
                diff.to_download.push(chapter.clone());
            }
            // Adopted and about-to-be-downloaded chapters are expected too.
            expected.insert(path);
        }

        let upstream_addresses: BTreeSet<&str> = upstream.chapters.iter().map(|c| c.address.as_str()).collect();
        diff.removed_upstream = entry
            .chapters
            .iter()
            .filter(|(address, _)| !upstream_addresses.contains(address.as_str()))
            .map(|(_, id)| *id)
            .collect();
        diff.to_delete_from_disk = archives.into_iter().filter(|p| !expected.contains(*p)).cloned().collect();
        Some(diff)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Summaries of every series `user` has added, ordered by title.
    pub fn view(&self, user: &str) -> Vec<SeriesSummary> {
        let mut summaries: Vec<SeriesSummary> = self
            .series
            .values()
            .filter_map(|entry| {
                let added_at = *entry.added_at.get(user)?;
                let chapters: Vec<&ChapterEntry> =
                    entry.chapters.values().filter_map(|c| self.chapters.get(c)).collect();
                let reads: Vec<UtcDateTime> = chapters.iter().filter_map(|c| c.read_at.get(user).copied()).collect();
                Some(SeriesSummary {
                    id: entry.id,
                    provider: entry.provider.clone(),
                    address: entry.address.clone(),
                    metadata: entry.metadata.clone(),
                    added_at,
                    checked_at: entry.checked_at,
                    chapter_count: chapters.len(),
                    read_count: reads.len(),
                    last_added_at: chapters.iter().map(|c| c.added_at).max(),
                    last_read_at: reads.into_iter().max(),
                })
            })
            .collect();
        summaries.sort_by(|a, b| a.metadata.title.cmp(&b.metadata.title).then(a.id.cmp(&b.id)));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn now() -> UtcDateTime {
        datetime!(2016-03-13 12:00 UTC).to_utc()
    }

    fn chapter(n: f64) -> Chapter {
        Chapter::new(format!("c{n}")).with_number(n)
    }

    fn series(numbers: &[f64]) -> Series {
        Series::new("Series").with_chapters(numbers.iter().map(|n| chapter(*n)))
    }

    fn archive(n: &str) -> PathBuf {
        PathBuf::from(format!("Series/Series #{n}.cbz"))
    }

    fn naming() -> NamingOptions {
        NamingOptions::default()
    }

    #[test]
    fn test_upsert_series_keeps_id_and_first_added_at() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[1.0]), "alice", now());
        let later = datetime!(2016-03-14 12:00 UTC).to_utc();
        assert_eq!(catalog.upsert_series("mock", "s", &Series::new("Renamed"), "alice", later), id);
        let entry = catalog.series(id).unwrap();
        assert_eq!(entry.metadata.title, "Renamed");
        assert!(entry.metadata.chapters.is_empty());
        assert_eq!(entry.added_at["alice"], now());
        assert_eq!(entry.checked_at, Some(later));
        assert_ne!(catalog.upsert_series("other", "s", &Series::new("Other"), "alice", now()), id);
    }

    #[test]
    fn test_diff_downloads_missing_chapter() {
        let mut catalog = Catalog::default();
        let upstream = series(&[1.0, 2.0, 3.0]);
        let id = catalog.upsert_series("mock", "s", &upstream, "alice", now());
        catalog.record_success(id, &chapter(1.0), now());
        catalog.record_success(id, &chapter(2.0), now());
        let diff = catalog.diff(id, &upstream, &[archive("001"), archive("002")], naming()).unwrap();
        assert_eq!(diff.to_download, vec![chapter(3.0)]);
        assert!(diff.to_adopt.is_empty());
        assert!(diff.removed_upstream.is_empty());
        assert!(diff.to_delete_from_disk.is_empty());
    }

    #[test]
    fn test_diff_keeps_chapters_removed_upstream() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[1.0, 2.0, 3.0]), "alice", now());
        for n in [1.0, 2.0, 3.0] {
            catalog.record_success(id, &chapter(n), now());
        }
        let on_disk = [archive("001"), archive("002"), archive("003")];
        let diff = catalog.diff(id, &series(&[1.0, 2.0]), &on_disk, naming()).unwrap();
        assert!(diff.to_download.is_empty());
        assert_eq!(diff.removed_upstream.len(), 1);
        // Still recorded, so its archive is not an orphan.
        assert!(diff.to_delete_from_disk.is_empty());
        assert_eq!(catalog.chapters(id).len(), 3);
    }

    #[test]
    fn test_diff_adopts_existing_archives() {
        let mut catalog = Catalog::default();
        let upstream = series(&[1.0, 2.0]);
        let id = catalog.upsert_series("mock", "s", &upstream, "alice", now());
        let diff = catalog.diff(id, &upstream, &[archive("001")], naming()).unwrap();
        assert_eq!(diff.to_adopt, vec![chapter(1.0)]);
        assert_eq!(diff.to_download, vec![chapter(2.0)]);
        assert!(diff.to_delete_from_disk.is_empty());
    }

    #[test]
    fn test_diff_redownloads_missing_archive() {
        let mut catalog = Catalog::default();
        let upstream = series(&[1.0]);
        let id = catalog.upsert_series("mock", "s", &upstream, "alice", now());
        catalog.record_success(id, &chapter(1.0), now());
        let diff = catalog.diff(id, &upstream, &[], naming()).unwrap();
        assert_eq!(diff.to_download, vec![chapter(1.0)]);
    }

    #[test]
    fn test_diff_finds_orphans_only_in_series_directory() {
        let mut catalog = Catalog::default();
        let upstream = series(&[1.0]).with_chapters([Chapter::new("extra").with_title("Omake")]);
        let id = catalog.upsert_series("mock", "s", &upstream, "alice", now());
        catalog.record_success(id, &chapter(1.0), now());
        let on_disk = [
            archive("001"),
            archive("099"),
            PathBuf::from("Series/notes.txt"),
            PathBuf::from("Series/Series #098.cbz.orphaned"),
            PathBuf::from("Other/Other #001.cbz"),
        ];
        let diff = catalog.diff(id, &upstream, &on_disk, naming()).unwrap();
        assert_eq!(diff.to_delete_from_disk, vec![archive("099")]);
        assert_eq!(diff.not_downloadable.len(), 1);
    }

    #[test]
    fn test_diff_skips_second_release_of_same_archive() {
        let mut catalog = Catalog::default();
        let first = Chapter::new("c1b").with_number(1.0).with_group("B");
        let second = Chapter::new("c1a").with_number(1.0).with_group("A");
        let upstream = Series::new("Series").with_chapters([first.clone(), second.clone(), chapter(2.0)]);
        let id = catalog.upsert_series("mock", "s", &upstream, "alice", now());

        let diff = catalog.diff(id, &upstream, &[], naming()).unwrap();
        assert_eq!(diff.to_download, vec![first.clone(), chapter(2.0)]);
        assert_eq!(diff.duplicates, vec![second.clone()]);

        // Present but unrecorded: only one of the two is adopted.
        let diff = catalog.diff(id, &upstream, &[archive("001")], naming()).unwrap();
        assert_eq!(diff.to_adopt, vec![first]);
        assert_eq!(diff.duplicates, vec![second.clone()]);
        assert!(diff.to_delete_from_disk.is_empty());

        // The recorded release keeps the archive even when listed later.
        catalog.record_success(id, &second, now());
        let diff = catalog.diff(id, &upstream, &[archive("001")], naming()).unwrap();
        assert!(diff.to_adopt.is_empty());
        assert_eq!(diff.duplicates.len(), 1);
        assert_eq!(diff.duplicates[0].address, "c1b");
    }

    #[test]
    fn test_diff_unknown_series() {
        assert!(Catalog::default().diff(SeriesId(7), &series(&[1.0]), &[], naming()).is_none());
    }

    #[test]
    fn test_record_success_is_stable() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[1.0]), "alice", now());
        let first = catalog.record_success(id, &chapter(1.0), now()).unwrap();
        let again = catalog.record_success(id, &chapter(1.0).with_title("Retitled"), now()).unwrap();
        assert_eq!(first, again);
        assert_eq!(catalog.chapter(first).unwrap().chapter.title, "Retitled");
        assert!(catalog.record_success(SeriesId(99), &chapter(1.0), now()).is_none());
    }

    #[test]
    fn test_remove_series_forgets_chapters_and_never_reuses_ids() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[1.0]), "alice", now());
        let chapter_id = catalog.record_success(id, &chapter(1.0), now()).unwrap();
        assert!(catalog.remove_series(id));
        assert!(!catalog.remove_series(id));
        assert!(catalog.chapter(chapter_id).is_none());
        assert!(catalog.find("mock", "s").is_none());
        let new_id = catalog.upsert_series("mock", "s", &series(&[1.0]), "alice", now());
        assert!(new_id.0 > chapter_id.0);
    }

    #[test]
    fn test_chapters_sorted_by_number() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[]), "alice", now());
        for chapter in [chapter(10.0), Chapter::new("extra"), chapter(2.5), chapter(2.0)] {
            catalog.record_success(id, &chapter, now());
        }
        let numbers: Vec<Option<f64>> = catalog.chapters(id).iter().map(|c| c.chapter.number.map(|n| n.value())).collect();
        assert_eq!(numbers, vec![Some(2.0), Some(2.5), Some(10.0), None]);
    }

    #[test]
    fn test_view_is_per_user() {
        let mut catalog = Catalog::default();
        let id = catalog.upsert_series("mock", "s", &series(&[1.0, 2.0]), "alice", now());
        catalog.upsert_series("mock", "t", &Series::new("Another"), "bob", now());
        let first = catalog.record_success(id, &chapter(1.0), now()).unwrap();
        let later = datetime!(2016-03-14 08:00 UTC).to_utc();
        catalog.record_success(id, &chapter(2.0), later);
        assert!(catalog.mark_read("alice", first, later));
        assert!(!catalog.mark_read("alice", ChapterId(404), later));

        let view = catalog.view("alice");
        assert_eq!(view.len(), 1);
        let summary = &view[0];
        assert_eq!(summary.id, id);
        assert_eq!(summary.added_at, now());
        assert_eq!(summary.chapter_count, 2);
        assert_eq!(summary.read_count, 1);
        assert_eq!(summary.last_added_at, Some(later));
        assert_eq!(summary.last_read_at, Some(later));
        assert_eq!(catalog.view("bob").len(), 1);
        assert!(catalog.view("carol").is_empty());
    }
}
