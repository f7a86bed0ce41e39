/// Formats `value` with its whole-number part zero-padded to at least `width`
/// digits. Fractional digits are kept as-is.
///
/// ```
/// use shelf_metadata::format_padded;
/// assert_eq!(format_padded(3, 7.0), "007");
/// assert_eq!(format_padded(3, 10.5), "010.5");
/// assert_eq!(format_padded(2, 1234.0), "1234");
/// ```
pub fn format_padded(width: usize, value: f64) -> String {
    // Adding zero turns -0.0 into 0.0.
    let text = (value + 0.0).to_string();
    let whole = text.find('.').unwrap_or(text.len());
    format!("{}{text}", "0".repeat(width.saturating_sub(whole)))
}

/// Parses a value produced by [`format_padded`] back into a number.
pub fn parse_padded(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 1.0, "001")]
    #[case(3, 12.0, "012")]
    #[case(3, 12.5, "012.5")]
    #[case(3, 999.0, "999")]
    #[case(3, 1000.0, "1000")]
    #[case(2, 0.0, "00")]
    #[case(2, -0.0, "00")]
    #[case(0, 4.25, "4.25")]
    fn test_format_padded(#[case] width: usize, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_padded(width, value), expected);
    }

    #[rstest]
    #[case(1.0)]
    #[case(7.5)]
    #[case(42.0)]
    #[case(100.25)]
    #[case(1001.0)]
    fn test_padding_survives_reparse(#[case] value: f64) {
        for width in [2, 3] {
            assert_eq!(parse_padded(&format_padded(width, value)), Some(value));
        }
    }

    #[test]
    fn test_parse_padded_rejects_garbage() {
        assert_eq!(parse_padded("abc"), None);
        assert_eq!(parse_padded(""), None);
        assert_eq!(parse_padded("inf"), None);
    }
}
