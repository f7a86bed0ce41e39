use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::sanitize;

/// Publication type of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Japanese comic (also the fallback when the source says nothing useful)
    #[default]
    Manga,
    /// Korean comic
    Manhwa,
    /// Chinese comic
    Manhua,
    /// Single-chapter work
    OneShot,
    /// Western comic
    Comic,
}
impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Manga => "Manga",
            SeriesKind::Manhwa => "Manhwa",
            SeriesKind::Manhua => "Manhua",
            SeriesKind::OneShot => "One Shot",
            SeriesKind::Comic => "Comic",
        }
    }
}
impl FromStr for SeriesKind {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "manhwa" | "webtoon" => Self::Manhwa,
            "manhua" => Self::Manhua,
            "oneshot" => Self::OneShot,
            "comic" | "comics" => Self::Comic,
            _ => Self::Manga,
        })
    }
}
impl Display for SeriesKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
