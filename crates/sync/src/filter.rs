use exn::ResultExt;
use regex::Regex;
use shelf_config::FilterSettings;
use shelf_metadata::models::{Chapter, ChapterNumber};

use crate::error::{ErrorKind, Result};

/// Decides which missing chapters are worth fetching.
///
/// Chapters without a number never pass. Criteria that depend on optional
/// chapter data (upload date, group, language) only reject chapters that
/// actually carry that data.
#[derive(Debug, Clone, Default)]
pub struct ChapterFilter {
    only: Option<ChapterNumber>,
    from: Option<ChapterNumber>,
    to: Option<ChapterNumber>,
    uploaded_from: Option<i64>,
    uploaded_to: Option<i64>,
    group: Option<Regex>,
    language: Option<String>,
}
impl ChapterFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &FilterSettings) -> Result<Self> {
        let invalid = |field: &str| ErrorKind::InvalidFilter(field.to_string());
        let number = |value: Option<f64>, field: &str| match value {
            Some(n) => ChapterNumber::new(n).map(Some).ok_or_else(|| exn::Exn::from(invalid(field))),
            None => Ok(None),
        };
        let mut filter = Self {
            only: number(settings.chapter, "chapter")?,
            from: number(settings.from, "from")?,
            to: number(settings.to, "to")?,
            uploaded_from: settings.uploaded_from_millis().or_raise(|| invalid("uploaded_from"))?,
            uploaded_to: settings.uploaded_to_millis().or_raise(|| invalid("uploaded_to"))?,
            group: None,
            language: None,
        };
        if let Some(group) = settings.group.as_deref() {
            filter = filter.with_group(group)?;
        }
        if let Some(language) = settings.language.as_deref() {
            filter = filter.with_language(language);
        }
        Ok(filter)
    }

    /// Only the chapter numbered `number`. Fractional parts matter.
    pub fn only(mut self, number: f64) -> Self {
        self.only = ChapterNumber::new(number);
        self
    }

    pub fn from_number(mut self, number: f64) -> Self {
        self.from = ChapterNumber::new(number);
        self
    }

    pub fn to_number(mut self, number: f64) -> Self {
        self.to = ChapterNumber::new(number);
        self
    }

    /// Unix milliseconds, inclusive.
    pub fn uploaded_from(mut self, millis: i64) -> Self {
        self.uploaded_from = Some(millis);
        self
    }

    /// Unix milliseconds, inclusive.
    pub fn uploaded_to(mut self, millis: i64) -> Self {
        self.uploaded_to = Some(millis);
        self
    }

    /// Keep chapters whose group matches `pattern` anywhere. A plain word
    /// works as a substring match.
    pub fn with_group(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).or_raise(|| ErrorKind::InvalidFilter(format!("group: {pattern}")))?;
        self.group = Some(regex);
        Ok(self)
    }

    /// Case-insensitive.
    pub fn with_language(mut self, language: &str) -> Self {
        let language = language.trim();
        self.language = (!language.is_empty()).then(|| language.to_string());
        self
    }

    pub fn passes(&self, chapter: &Chapter) -> bool {
        let Some(number) = chapter.number else {
            return false;
        };
        if self.only.is_some_and(|only| number != only)
            || self.from.is_some_and(|from| number < from)
            || self.to.is_some_and(|to| number > to)
        {
            return false;
        }
        if let Some(uploaded) = chapter.uploaded_at
            && (self.uploaded_from.is_some_and(|from| uploaded < from)
                || self.uploaded_to.is_some_and(|to| uploaded > to))
        {
            return false;
        }
        if let (Some(pattern), Some(group)) = (&self.group, &chapter.group)
            && !pattern.is_match(group)
        {
            return false;
        }
        if let (Some(wanted), Some(language)) = (&self.language, &chapter.language)
            && !wanted.eq_ignore_ascii_case(language)
        {
            return false;
        }
        true
    }
}
