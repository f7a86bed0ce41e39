//! Archives on the local filesystem, below a library root.

use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::backend::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::path::{is_partial, validate as validate_path};
use crate::{FileInfo, StorageBackend};

/// Storage rooted at a directory on the local filesystem.
///
/// # Examples
///
/// ```no_run
/// use shelf_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("library", "/srv/comics")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// `root` must be absolute. It is created when missing.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Once, at startup.
        std::fs::create_dir_all(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    fn relative(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute
            .strip_prefix(&self.root)
            .or_raise(|| ErrorKind::InvalidPath(absolute.to_path_buf()))?;
        validate_path(relative)
    }

    async fn file_info(&self, relative: &Path, absolute: &Path) -> Result<FileInfo> {
        let metadata = fs::metadata(absolute).await.map_err(|e| ErrorKind::from_io(e, relative))?;
        let modified = metadata.modified().map_err(|e| ErrorKind::from_io(e, relative))?;
        Ok(FileInfo::new(relative, metadata.len(), OffsetDateTime::from(modified).to_utc()))
    }

    async fn ensure_parent(&self, absolute: &Path, relative: &Path) -> Result<()> {
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, relative))?;
        }
        Ok(())
    }

    /// Files in `directory` and the subdirectories to visit next.
    async fn read_directory(&self, directory: &Path) -> Result<(Vec<FileInfo>, Vec<PathBuf>)> {
        let mut files = Vec::new();
        let mut subdirectories = Vec::new();
        let mut entries = match fs::read_dir(directory).await {
            Ok(entries) => entries,
            // Removed while walking, or never there.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((files, subdirectories)),
            Err(e) => exn::bail!(ErrorKind::from_io(e, directory)),
        };
        while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, directory))? {
            let absolute = entry.path();
            let file_type = entry.file_type().await.map_err(|e| ErrorKind::from_io(e, &absolute))?;
            if file_type.is_dir() {
                subdirectories.push(absolute);
            } else if file_type.is_file() {
                let relative = self.relative(&absolute)?;
                if !is_partial(&relative) {
                    files.push(self.file_info(&relative, &absolute).await?);
                }
            }
        }
        Ok((files, subdirectories))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let start = match prefix {
            Some(prefix) => self.resolve(prefix),
            None => Ok(self.root.clone()),
        };

        Box::pin(stream! {
            let start = match start {
                Ok(start) => start,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            // A prefix may name a single file.
            if fs::metadata(&start).await.is_ok_and(|metadata| metadata.is_file()) {
                match self.relative(&start) {
                    Ok(relative) if !is_partial(&relative) => yield self.file_info(&relative, &start).await,
                    Ok(_) => {},
                    Err(e) => yield Err(e),
                }
                return;
            }
            let mut pending = vec![start];
            while let Some(directory) = pending.pop() {
                match self.read_directory(&directory).await {
                    Ok((files, subdirectories)) => {
                        pending.extend(subdirectories);
                        for file in files {
                            yield Ok(file);
                        }
                    },
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let absolute = self.resolve(path)?;
        fs::try_exists(&absolute).await.map_err(|e| exn::Exn::from(ErrorKind::from_io(e, path)))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let absolute = self.resolve(path)?;
        fs::read(&absolute).await.map_err(|e| exn::Exn::from(ErrorKind::from_io(e, path)))
    }

    /// Flushed to disk before returning, so that a rename performed
    /// afterwards never exposes a truncated archive.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let absolute = self.resolve(path)?;
        self.ensure_parent(&absolute, path).await?;
        let io = |e| ErrorKind::from_io(e, path);
        let mut file = fs::File::create(&absolute).await.map_err(io)?;
        file.write_all(data).await.map_err(io)?;
        file.sync_all().await.map_err(io)?;
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let absolute = self.resolve(path)?;
        fs::remove_file(&absolute).await.map_err(|e| exn::Exn::from(ErrorKind::from_io(e, path)))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        self.ensure_parent(&target, to).await?;
        fs::rename(&source, &target).await.map_err(|e| exn::Exn::from(ErrorKind::from_io(e, from)))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let relative = validate_path(path)?;
        let absolute = self.root.join(&relative);
        self.file_info(&relative, &absolute).await
    }
}
