use time::UtcDateTime;

use super::ChapterNumber;
use crate::date::parse_upload_date;
use crate::scan::scan;

/// One downloadable unit of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Source address, unique within the owning series
    pub address: String,
    /// Absent for chapters that are not part of the regular numbering
    pub number: Option<ChapterNumber>,
    pub volume: Option<u32>,
    /// May be empty
    pub title: String,
    /// Re-release counter some sources attach to the number (`Ch.12v2`)
    pub version: Option<u32>,
    /// Scanlation group
    pub group: Option<String>,
    pub language: Option<String>,
    /// Unix epoch, in milliseconds
    pub uploaded_at: Option<i64>,
}
impl Chapter {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            number: None,
            volume: None,
            title: String::new(),
            version: None,
            group: None,
            language: None,
            uploaded_at: None,
        }
    }

    /// Build a chapter from the loosely formatted strings a source page
    /// provides. Unparsable parts are left absent.
    pub fn from_scraped(
        address: impl Into<String>,
        name: &str,
        uploaded: Option<&str>,
        group: Option<&str>,
        language: Option<&str>,
        now: UtcDateTime,
    ) -> Self {
        let scanned = scan(name);
        Self {
            address: address.into(),
            number: scanned.number,
            volume: scanned.volume,
            title: scanned.title,
            version: scanned.version,
            group: non_blank(group),
            language: non_blank(language),
            uploaded_at: uploaded.and_then(|raw| parse_upload_date(raw, now)),
        }
    }

    pub fn with_number(mut self, number: f64) -> Self {
        self.number = ChapterNumber::new(number);
        self
    }

    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_uploaded_at(mut self, millis: i64) -> Self {
        self.uploaded_at = Some(millis);
        self
    }

    /// Regular chapters carry a number; everything else is skipped by
    /// filters and never gets an archive name.
    pub fn is_regular(&self) -> bool {
        self.number.is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
