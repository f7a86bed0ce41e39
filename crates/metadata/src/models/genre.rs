use super::sanitize;

/// Canonical spelling of a scraped genre tag, or `None` for blank input.
///
/// Sources disagree on spelling for a handful of genres; those are mapped to a
/// single name so that the same genre never appears twice in a series.
pub fn canonical_genre(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match sanitize(trimmed).as_str() {
        "oneshot" => "One Shot".to_string(),
        "scifi" | "sciencefiction" => "Science Fiction".to_string(),
        "sliceoflife" => "Slice of Life".to_string(),
        "shoujoai" => "Shoujo Ai".to_string(),
        "shounenai" => "Shounen Ai".to_string(),
        _ => trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Oneshot", Some("One Shot"))]
    #[case("Sci-fi", Some("Science Fiction"))]
    #[case("slice of life", Some("Slice of Life"))]
    #[case(" Action ", Some("Action"))]
    #[case("   ", None)]
    fn test_canonical_genre(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(canonical_genre(raw).as_deref(), expected);
    }
}
