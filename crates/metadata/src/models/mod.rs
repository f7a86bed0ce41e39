mod chapter;
mod genre;
mod kind;
mod number;
mod series;

pub use self::chapter::Chapter;
pub use self::genre::canonical_genre;
pub use self::kind::SeriesKind;
pub use self::number::ChapterNumber;
pub use self::series::Series;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace(['-', '_', ' '], "")
}
