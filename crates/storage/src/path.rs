//! Path validation utilities.
//!
//! Every backend funnels relative paths through [`validate`] so that nothing
//! built from scraped titles can escape the library root.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Suffix of in-progress files written by
/// [`write_atomic`](crate::StorageBackend::write_atomic).
pub const PARTIAL_SUFFIX: &str = "partial";

/// Validates a storage path and returns it normalized.
///
/// `..` components are resolved lexically and may never climb above the
/// storage root. Null bytes, Windows prefixes and paths that normalize to
/// nothing are rejected with [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelf_storage::validate_path;
/// assert!(validate_path("Series/Series #001.cbz").is_ok());
/// assert!(validate_path("Series/../Other/Other #001.cbz").is_ok());
/// assert!(validate_path("../Series #001.cbz").is_err());
/// assert!(validate_path("Series/../../escape").is_err());
/// assert!(validate_path("nul\0byte").is_err());
/// assert_eq!(
///     validate_path("./Series//./Series #001.cbz/").unwrap(),
///     Path::new("Series/Series #001.cbz")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(path.as_ref().to_path_buf());
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes truncate paths in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}

/// Hidden sibling that a file is staged under before being renamed into
/// place: `Series/Series #001.cbz` becomes `Series/.Series #001.cbz.partial`.
pub fn partial_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or(path.as_os_str()));
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Whether `path` names a file staged by
/// [`write_atomic`](crate::StorageBackend::write_atomic) that has not been
/// renamed into place yet. Listings skip these.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(&format!(".{PARTIAL_SUFFIX}")))
}
