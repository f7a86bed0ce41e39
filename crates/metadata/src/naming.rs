//! Archive naming.
//!
//! Archives live at `<series>/<series> V<vv> #<nnn>[ 'title'][ (lang)][ [group]].cbz`
//! relative to the library root. Both the archive writer and the catalog's
//! orphan detection derive paths from here, so the two always agree.

use std::path::PathBuf;

use crate::consts::{NAME_ILLEGAL_REGEX, SERIES_ILLEGAL_REGEX, TRAILING_DOTS_REGEX};
use crate::models::Chapter;

/// File extension of committed archives.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Which optional parts of a chapter end up in its file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamingOptions {
    pub title: bool,
    pub language: bool,
    pub group: bool,
}

/// Directory name for a series, or `None` if nothing usable is left after
/// stripping characters that filesystems reject.
pub fn series_directory(title: &str) -> Option<String> {
    let stripped = SERIES_ILLEGAL_REGEX.replace_all(title.trim(), "");
    let name = match stripped.strip_suffix('.') {
        Some(rest) => format!("{rest}. (Suffixed)"),
        None => stripped.into_owned(),
    };
    (!name.trim().is_empty()).then_some(name)
}

/// File name of a chapter's archive.
///
/// Chapters without a number are not downloadable and yield `None`.
pub fn chapter_file_name(series_title: &str, chapter: &Chapter, options: NamingOptions) -> Option<String> {
    let number = chapter.number?;
    let mut name = series_directory(series_title)?;
    if let Some(volume) = chapter.volume {
        name.push_str(&format!(" V{:02}", volume));
    }
    name.push_str(&format!(" #{}", number.padded(3)));
    if options.title {
        let title = TRAILING_DOTS_REGEX.replace(&chapter.title, "");
        if !title.is_empty() {
            name.push_str(&format!(" '{}'", NAME_ILLEGAL_REGEX.replace_all(&title, "_")));
        }
    }
    if options.language
        && let Some(language) = &chapter.language
    {
        name.push_str(&format!(" ({})", NAME_ILLEGAL_REGEX.replace_all(language, "_")));
    }
    if options.group
        && let Some(group) = &chapter.group
    {
        name.push_str(&format!(" [{}]", NAME_ILLEGAL_REGEX.replace_all(group, "_")));
    }
    name.push('.');
    name.push_str(ARCHIVE_EXTENSION);
    Some(name)
}

/// Path of a chapter's archive relative to the library root.
pub fn chapter_path(series_title: &str, chapter: &Chapter, options: NamingOptions) -> Option<PathBuf> {
    let directory = series_directory(series_title)?;
    let file_name = chapter_file_name(series_title, chapter, options)?;
    Some(PathBuf::from(directory).join(file_name))
}

/// Whether `path` looks like a committed archive.
pub fn is_archive(path: &std::path::Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}
