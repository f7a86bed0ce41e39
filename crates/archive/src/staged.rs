//! Staged archives.
//!
//! Entries are collected in memory and only reach storage on
//! [`commit`](StagedArchive::commit), as one atomic write. Until then readers
//! cannot observe anything, and [`rollback`](StagedArchive::rollback) has
//! nothing to undo on disk.

use exn::ResultExt;
use shelf_metadata::format_padded;
use shelf_storage::{BackendHandle, FileInfo};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::comicinfo::COMIC_INFO;
use crate::error::{ErrorKind, Result};

/// Position of an entry inside an archive.
///
/// The derived ordering is the order entries are written in: pages by
/// number, then the preview, then the metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Page number, starting at 1
    Page(u32),
    /// Series preview image, stored as page `000`
    Preview,
    /// `ComicInfo.xml`
    Metadata,
}
impl Slot {
    /// Entry name inside the archive.
    pub fn file_name(&self, extension: &str) -> String {
        match self {
            Slot::Page(number) => format!("{}.{extension}", format_padded(3, f64::from(*number))),
            Slot::Preview => format!("000.{extension}"),
            Slot::Metadata => COMIC_INFO.to_string(),
        }
    }
}

/// An archive under construction.
pub struct StagedArchive {
    backend: BackendHandle,
    path: PathBuf,
    entries: BTreeMap<Slot, (String, Vec<u8>)>,
}
impl StagedArchive {
    /// Start staging an archive that will be committed to `path`.
    pub fn create(backend: BackendHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage an entry. Each slot can only be written once, and pages are
    /// numbered from 1.
    pub fn write(&mut self, slot: Slot, extension: &str, bytes: Vec<u8>) -> Result<()> {
        if slot == Slot::Page(0) {
            exn::bail!(ErrorKind::InvalidPage(0));
        }
        let name = slot.file_name(extension);
        if self.entries.contains_key(&slot) {
            exn::bail!(ErrorKind::DuplicateEntry(name));
        }
        self.entries.insert(slot, (name, bytes));
        Ok(())
    }

    /// Encode every staged entry and atomically write the archive.
    ///
    /// On failure no archive (and no partial file) is left behind.
    pub async fn commit(self) -> Result<FileInfo> {
        let entries: Vec<(String, Vec<u8>)> = self.entries.into_values().collect();
        let count = entries.len();
        let bytes = tokio::task::spawn_blocking(move || encode(entries)).await.or_raise(|| ErrorKind::Task)??;
        self.backend.write_atomic(&self.path, &bytes).await.or_raise(|| ErrorKind::Storage)?;
        debug!(path = %self.path.display(), entries = count, size = bytes.len(), "archive committed");
        self.backend.stat(&self.path).await.or_raise(|| ErrorKind::Storage)
    }

    /// Discard every staged entry.
    pub fn rollback(self) {
        debug!(path = %self.path.display(), entries = self.entries.len(), "archive rolled back");
    }
}

fn encode(entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>> {
    // Page images are already compressed.
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(name, options).or_raise(|| ErrorKind::Encode)?;
        zip.write_all(&bytes).or_raise(|| ErrorKind::Encode)?;
    }
    Ok(zip.finish().or_raise(|| ErrorKind::Encode)?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_storage::backend::MockBackend;
    use shelf_storage::{StorageBackend, partial_sibling};
    use std::sync::Arc;
    use zip::ZipArchive;

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len()).map(|i| archive.by_index(i).unwrap().name().to_string()).collect()
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(Slot::Page(1).file_name("jpg"), "001.jpg");
        assert_eq!(Slot::Page(1000).file_name("png"), "1000.png");
        assert_eq!(Slot::Preview.file_name("png"), "000.png");
        assert_eq!(Slot::Metadata.file_name("ignored"), "ComicInfo.xml");
    }

    #[tokio::test]
    async fn test_commit_orders_entries() {
        let backend = Arc::new(MockBackend::default());
        let mut archive = StagedArchive::create(backend.clone(), "Series/Series #001.cbz");
        archive.write(Slot::Metadata, "xml", b"<ComicInfo/>".to_vec()).unwrap();
        archive.write(Slot::Page(3), "png", b"3".to_vec()).unwrap();
        archive.write(Slot::Preview, "png", b"0".to_vec()).unwrap();
        archive.write(Slot::Page(1), "jpg", b"1".to_vec()).unwrap();
        archive.write(Slot::Page(2), "png", b"2".to_vec()).unwrap();
        let info = archive.commit().await.unwrap();
        assert_eq!(info.path, Path::new("Series/Series #001.cbz"));
        let bytes = backend.read(Path::new("Series/Series #001.cbz")).await.unwrap();
        assert_eq!(entry_names(bytes), vec!["001.jpg", "002.png", "003.png", "000.png", "ComicInfo.xml"]);
    }

    #[tokio::test]
    async fn test_duplicate_slot_is_rejected() {
        let backend = Arc::new(MockBackend::default());
        let mut archive = StagedArchive::create(backend, "a.cbz");
        archive.write(Slot::Page(1), "png", vec![1]).unwrap();
        let err = archive.write(Slot::Page(1), "jpg", vec![2]).unwrap_err();
        assert_eq!(*err, ErrorKind::DuplicateEntry("001.jpg".to_string()));
        assert_eq!(archive.len(), 1);
    }

    #[tokio::test]
    async fn test_page_zero_is_rejected() {
        let backend = Arc::new(MockBackend::default());
        let mut archive = StagedArchive::create(backend, "a.cbz");
        archive.write(Slot::Preview, "png", vec![0]).unwrap();
        let err = archive.write(Slot::Page(0), "png", vec![1]).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidPage(0));
        assert_eq!(archive.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_is_visible_before_commit() {
        let backend = Arc::new(MockBackend::default());
        let mut archive = StagedArchive::create(backend.clone(), "Series/Series #001.cbz");
        archive.write(Slot::Page(1), "png", vec![1]).unwrap();
        assert!(backend.paths().await.is_empty());
        archive.rollback();
        assert!(backend.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_nothing() {
        let path = Path::new("Series/Series #001.cbz");
        let backend = Arc::new(MockBackend::default().failing_on(path));
        let mut archive = StagedArchive::create(backend.clone(), path);
        archive.write(Slot::Page(1), "png", vec![1]).unwrap();
        let err = archive.commit().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Storage);
        assert!(!backend.exists(path).await.unwrap());
        assert!(!backend.exists(&partial_sibling(path)).await.unwrap());
    }
}
