use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};
use crate::padding::format_padded;

/// A chapter number as published by the source.
///
/// Numbers may be fractional for specials and extras (`12.5`). Only finite,
/// non-negative values can be represented, which makes the type totally
/// ordered.
#[derive(Debug, Clone, Copy)]
pub struct ChapterNumber(f64);
impl ChapterNumber {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value + 0.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Zero-padded representation used in archive names.
    pub fn padded(&self, width: usize) -> String {
        format_padded(width, self.0)
    }
}
impl PartialEq for ChapterNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ChapterNumber {}
impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
impl Hash for ChapterNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
impl FromStr for ChapterNumber {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().ok().and_then(Self::new).ok_or_else(|| {
            exn::Exn::from(ErrorKind::ParseError {
                field: "chapter number",
                value: s.to_string(),
            })
        })
    }
}
impl TryFrom<f64> for ChapterNumber {
    type Error = Error;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            exn::Exn::from(ErrorKind::ParseError {
                field: "chapter number",
                value: value.to_string(),
            })
        })
    }
}
impl Display for ChapterNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite_and_negative() {
        assert!(ChapterNumber::new(f64::NAN).is_none());
        assert!(ChapterNumber::new(f64::INFINITY).is_none());
        assert!(ChapterNumber::new(-1.0).is_none());
        assert!("twelve".parse::<ChapterNumber>().is_err());
    }

    #[test]
    fn test_ordering_handles_fractions() {
        let mut numbers: Vec<ChapterNumber> =
            ["10", "2", "2.5", "1"].iter().map(|s| s.parse().unwrap()).collect();
        numbers.sort();
        let values: Vec<f64> = numbers.iter().map(ChapterNumber::value).collect();
        assert_eq!(values, vec![1.0, 2.0, 2.5, 10.0]);
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let zero = ChapterNumber::new(-0.0).unwrap();
        assert_eq!(zero, ChapterNumber::new(0.0).unwrap());
        assert_eq!(zero.padded(3), "000");
    }
}
