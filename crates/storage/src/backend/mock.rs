//! In-memory storage for tests.

use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::{is_partial, validate as validate_path};

struct StoredFile {
    modified: UtcDateTime,
    data: Vec<u8>,
}
impl StoredFile {
    fn info(&self, path: &Path) -> FileInfo {
        FileInfo::new(path, self.data.len() as u64, self.modified)
    }
}

/// Storage held in memory, ordered by path.
///
/// Writes or renames onto paths registered with
/// [`failing_on`](Self::failing_on) are [refused](ErrorKind::Refused), which
/// lets tests drive rollback paths.
///
/// # Examples
///
/// ```
/// use shelf_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("Series/Series #001.cbz", b"PK..")]);
/// assert!(backend.exists(Path::new("Series/Series #001.cbz")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    files: RwLock<BTreeMap<PathBuf, StoredFile>>,
    refused: Vec<PathBuf>,
}
impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            files: RwLock::new(BTreeMap::new()),
            refused: Vec::new(),
        }
    }
}
impl MockBackend {
    /// Panics on paths that do not validate.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let modified = UtcDateTime::now();
        let files: BTreeMap<PathBuf, StoredFile> = files
            .into_iter()
            .map(|(path, data)| {
                let path = path.into();
                match validate_path(&path) {
                    Ok(path) => (path, StoredFile { modified, data: data.into() }),
                    Err(_) => panic!("MockBackend::with_files: invalid path {}", path.display()),
                }
            })
            .collect();
        Self {
            files: RwLock::new(files),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Refuse every write or rename onto `path` (or below it).
    pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.refused.push(path.into());
        self
    }

    /// Every stored path, partial files included, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    fn writable(&self, path: &Path) -> Result<()> {
        if self.refused.iter().any(|refused| path.starts_with(refused)) {
            exn::bail!(ErrorKind::Refused(format!("writing {} is disabled", path.display())));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        Box::pin(stream! {
            let prefix = match prefix.map(validate_path).transpose() {
                Ok(prefix) => prefix,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            // Collected first so that the lock is not held across a yield.
            let listed: Vec<FileInfo> = self
                .files
                .read()
                .await
                .iter()
                .filter(|(path, _)| !is_partial(path) && prefix.as_ref().is_none_or(|p| path.starts_with(p)))
                .map(|(path, file)| file.info(path))
                .collect();
            for info in listed {
                yield Ok(info);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.files.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        match self.files.read().await.get(&path) {
            Some(file) => Ok(file.data.clone()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.writable(&path)?;
        let file = StoredFile {
            modified: UtcDateTime::now(),
            data: data.to_vec(),
        };
        self.files.write().await.insert(path, file);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        match self.files.write().await.remove(&path) {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let (from, to) = (validate_path(from)?, validate_path(to)?);
        self.writable(&to)?;
        let mut files = self.files.write().await;
        let Some(file) = files.remove(&from) else {
            exn::bail!(ErrorKind::NotFound(from));
        };
        files.insert(to, file);
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        match self.files.read().await.get(&path) {
            Some(file) => Ok(file.info(&path)),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }
}
