use std::path::PathBuf;
use time::UtcDateTime;

/// What a backend knows about a stored file without reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative to the storage root
    pub path: PathBuf,
    /// Bytes
    pub size: u64,
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }
}
