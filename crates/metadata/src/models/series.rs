use std::collections::BTreeSet;

use super::{Chapter, SeriesKind, canonical_genre};

/// A titled work as described by one provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub title: String,
    pub kind: SeriesKind,
    /// Canonical genre names; see [`canonical_genre`]
    pub genres: BTreeSet<String>,
    pub artists: Vec<String>,
    pub authors: Vec<String>,
    pub summary: Option<String>,
    pub chapters: Vec<Chapter>,
}
impl Series {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Adds genres, canonicalizing their spelling and dropping blanks.
    pub fn with_genres<'a>(mut self, genres: impl IntoIterator<Item = &'a str>) -> Self {
        self.genres.extend(genres.into_iter().filter_map(canonical_genre));
        self
    }

    pub fn with_chapters(mut self, chapters: impl IntoIterator<Item = Chapter>) -> Self {
        self.chapters.extend(chapters);
        self
    }

    /// Source pages list chapters newest first. Consumers expect reading
    /// order, so the scraped sequence is reversed exactly once here.
    pub fn into_chronological(mut self) -> Self {
        self.chapters.reverse();
        self
    }

    pub fn chapter(&self, address: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.address == address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_chronological_reverses_scrape_order() {
        let series = Series::new("Title")
            .with_chapters([Chapter::new("c3").with_number(3.0), Chapter::new("c2"), Chapter::new("c1").with_number(1.0)])
            .into_chronological();
        let addresses: Vec<&str> = series.chapters.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(addresses, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_genres_are_deduplicated() {
        let series = Series::new("Title").with_genres(["Sci-fi", "Science Fiction", " ", "Action"]);
        assert_eq!(series.genres.len(), 2);
        assert!(series.genres.contains("Science Fiction"));
    }
}
