use crate::consts::{BARE_NUMBER_REGEX, CHAPTER_REGEX, READ_ONLINE_REGEX, TITLE_REGEX, TRAILING_DOTS_REGEX, VOLUME_REGEX};
use crate::models::ChapterNumber;

/// Typed values recovered from a chapter's display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterMetadata {
    /// `None` marks the chapter as not part of the regular numbering.
    pub number: Option<ChapterNumber>,
    pub volume: Option<u32>,
    pub version: Option<u32>,
    pub title: String,
}

/// Normalize a scraped chapter name such as `"Vol.01 Ch.012.5v2: Title"`.
///
/// Never fails: anything that cannot be recognized is left absent (or empty,
/// for the title).
pub fn scan(raw: &str) -> ChapterMetadata {
    let text = READ_ONLINE_REGEX.replace(raw.trim(), "");
    let volume = VOLUME_REGEX.captures(&text).and_then(|c| c[1].parse().ok());
    let (number, version) = match CHAPTER_REGEX.captures(&text).or_else(|| BARE_NUMBER_REGEX.captures(&text)) {
        Some(captures) => (
            captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()).and_then(ChapterNumber::new),
            captures.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    };
    let title = TITLE_REGEX
        .captures(&text)
        .map(|c| TRAILING_DOTS_REGEX.replace(c[1].trim(), "").into_owned())
        .unwrap_or_default();
    ChapterMetadata { number, volume, version, title }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Vol.01 Ch.012: The Beginning", Some(12.0), Some(1), None, "The Beginning")]
    #[case("Ch.12.5", Some(12.5), None, None, "")]
    #[case("Chapter 7 - Homecoming...", Some(7.0), None, None, "Homecoming")]
    #[case("Volume 3 Chapter 20v2", Some(20.0), Some(3), Some(2), "")]
    #[case("15: Read Online", Some(15.0), None, None, "")]
    #[case("003 - Side", Some(3.0), None, None, "Side")]
    #[case("Oneshot: Extra", None, None, None, "Extra")]
    #[case("", None, None, None, "")]
    fn test_scan(
        #[case] raw: &str,
        #[case] number: Option<f64>,
        #[case] volume: Option<u32>,
        #[case] version: Option<u32>,
        #[case] title: &str,
    ) {
        let metadata = scan(raw);
        assert_eq!(metadata.number.map(|n| n.value()), number);
        assert_eq!(metadata.volume, volume);
        assert_eq!(metadata.version, version);
        assert_eq!(metadata.title, title);
    }
}
