use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shelf_metadata::naming::NamingOptions;
use std::path::PathBuf;

pub const DEFAULT_USER: &str = "default";
/// Relative to the library root.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";
pub const DEFAULT_PAGE_CONCURRENCY: usize = 4;
pub const DEFAULT_SERIES_CONCURRENCY: usize = 1;

/// Everything a synchronization run can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory archives are written under.
    pub library_root: PathBuf,
    /// Catalog document location, relative to `library_root`.
    pub catalog_path: PathBuf,
    /// Whose "added" and "read" markers are touched.
    pub user: String,
    /// Log what would be fetched without fetching, writing or renaming.
    pub dry_run: bool,
    /// Rename archives no chapter accounts for after each series.
    pub cleanup: bool,
    pub naming: NamingSettings,
    pub filter: FilterSettings,
    pub processors: ProcessorSettings,
    /// Pages fetched at the same time within one chapter.
    pub page_concurrency: usize,
    /// Series synchronized at the same time.
    pub series_concurrency: usize,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            user: DEFAULT_USER.to_string(),
            dry_run: false,
            cleanup: true,
            naming: NamingSettings::default(),
            filter: FilterSettings::default(),
            processors: ProcessorSettings::default(),
            page_concurrency: DEFAULT_PAGE_CONCURRENCY,
            series_concurrency: DEFAULT_SERIES_CONCURRENCY,
        }
    }
}

fn default_library_root() -> PathBuf {
    match ProjectDirs::from("", "", "shelf") {
        Some(dirs) => dirs.data_dir().join("library"),
        None => PathBuf::from("library"),
    }
}

/// Optional parts of archive file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSettings {
    pub title: bool,
    pub language: bool,
    pub group: bool,
}
impl From<NamingSettings> for NamingOptions {
    fn from(settings: NamingSettings) -> Self {
        Self {
            title: settings.title,
            language: settings.language,
            group: settings.group,
        }
    }
}

/// Which chapters are considered for download. Every criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Only this chapter number.
    pub chapter: Option<f64>,
    /// Lowest chapter number, inclusive.
    pub from: Option<f64>,
    /// Highest chapter number, inclusive.
    pub to: Option<f64>,
    /// Earliest upload, as `YYYY-MM-DD` or RFC 3339.
    pub uploaded_from: Option<String>,
    /// Latest upload, as `YYYY-MM-DD` or RFC 3339.
    pub uploaded_to: Option<String>,
    /// Regular expression the scanlation group must match.
    pub group: Option<String>,
    /// Preferred language.
    pub language: Option<String>,
}

/// Toggles for the page processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Crop solid-color footer bands.
    pub footer: bool,
}
impl Default for ProcessorSettings {
    fn default() -> Self {
        Self { footer: true }
    }
}
