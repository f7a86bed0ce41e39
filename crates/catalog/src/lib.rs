mod catalog;
mod document;
pub mod error;
mod models;
mod repo;

pub use crate::catalog::Catalog;
pub use crate::models::{ChapterEntry, ChapterId, Diff, SeriesEntry, SeriesId, SeriesSummary};
pub use crate::repo::Repository;
