//! On-storage representation of the catalog.
//!
//! Only entity rows are stored. The provider and chapter indexes are rebuilt
//! on load, so they can never disagree with the rows.

use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use shelf_metadata::models::{Chapter, ChapterNumber, Series, SeriesKind};
use std::collections::BTreeMap;
use time::UtcDateTime;

use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result};
use crate::models::{ChapterEntry, ChapterId, SeriesEntry, SeriesId};

pub(crate) const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CatalogDocument {
    version: u32,
    next_id: u64,
    #[serde(default)]
    series: Vec<SeriesRow>,
    #[serde(default)]
    chapters: Vec<ChapterRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SeriesRow {
    id: u64,
    provider: String,
    address: String,
    title: String,
    kind: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    authors: Vec<String>,
    summary: Option<String>,
    #[serde(default)]
    added_at: BTreeMap<String, i64>,
    checked_at: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChapterRow {
    id: u64,
    series: u64,
    address: String,
    number: Option<f64>,
    volume: Option<u32>,
    #[serde(default)]
    title: String,
    version: Option<u32>,
    group: Option<String>,
    language: Option<String>,
    uploaded_at: Option<i64>,
    added_at: i64,
    #[serde(default)]
    read_at: BTreeMap<String, i64>,
}

fn to_millis(at: UtcDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).or_raise(|| ErrorKind::InvalidData(field))
}

fn from_millis_map(map: BTreeMap<String, i64>, field: &'static str) -> Result<BTreeMap<String, UtcDateTime>> {
    map.into_iter().map(|(user, millis)| Ok((user, from_millis(millis, field)?))).collect()
}

impl From<&Catalog> for CatalogDocument {
    fn from(catalog: &Catalog) -> Self {
        let series = catalog
            .series
            .values()
            .map(|entry| SeriesRow {
                id: entry.id.0,
                provider: entry.provider.clone(),
                address: entry.address.clone(),
                title: entry.metadata.title.clone(),
                kind: entry.metadata.kind.as_str().to_string(),
                genres: entry.metadata.genres.iter().cloned().collect(),
                artists: entry.metadata.artists.clone(),
                authors: entry.metadata.authors.clone(),
                summary: entry.metadata.summary.clone(),
                added_at: entry.added_at.iter().map(|(u, at)| (u.clone(), to_millis(*at))).collect(),
                checked_at: entry.checked_at.map(to_millis),
            })
            .collect();
        let chapters = catalog
            .chapters
            .values()
            .map(|entry| ChapterRow {
                id: entry.id.0,
                series: entry.series.0,
                address: entry.chapter.address.clone(),
                number: entry.chapter.number.map(|n| n.value()),
                volume: entry.chapter.volume,
                title: entry.chapter.title.clone(),
                version: entry.chapter.version,
                group: entry.chapter.group.clone(),
                language: entry.chapter.language.clone(),
                uploaded_at: entry.chapter.uploaded_at,
                added_at: to_millis(entry.added_at),
                read_at: entry.read_at.iter().map(|(u, at)| (u.clone(), to_millis(*at))).collect(),
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            next_id: catalog.next_id,
            series,
            chapters,
        }
    }
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = crate::error::Error;

    fn try_from(document: CatalogDocument) -> Result<Self> {
        if document.version != DOCUMENT_VERSION {
            exn::bail!(ErrorKind::InvalidData("version"));
        }
        let mut catalog = Catalog {
            next_id: document.next_id,
            ..Catalog::default()
        };
        for row in document.series {
            if row.id > catalog.next_id {
                exn::bail!(ErrorKind::InvalidData("series.id"));
            }
            let id = SeriesId(row.id);
            let Ok(kind) = row.kind.parse::<SeriesKind>();
            let metadata = Series {
                title: row.title,
                kind,
                // Stored genres are already canonical.
                genres: row.genres.into_iter().collect(),
                artists: row.artists,
                authors: row.authors,
                summary: row.summary,
                chapters: Vec::new(),
            };
            let index = catalog.providers.entry(row.provider.clone()).or_default();
            if index.insert(row.address.clone(), id).is_some() {
                exn::bail!(ErrorKind::InvalidData("series.address"));
            }
            let entry = SeriesEntry {
                id,
                provider: row.provider,
                address: row.address,
                metadata,
                added_at: from_millis_map(row.added_at, "series.added_at")?,
                checked_at: row.checked_at.map(|at| from_millis(at, "series.checked_at")).transpose()?,
                chapters: BTreeMap::new(),
            };
            if catalog.series.insert(id, entry).is_some() {
                exn::bail!(ErrorKind::InvalidData("series.id"));
            }
        }
        for row in document.chapters {
            if row.id > catalog.next_id {
                exn::bail!(ErrorKind::InvalidData("chapter.id"));
            }
            let id = ChapterId(row.id);
            let number = row
                .number
                .map(|n| ChapterNumber::new(n).ok_or_raise(|| ErrorKind::InvalidData("chapter.number")))
                .transpose()?;
            let chapter = Chapter {
                address: row.address,
                number,
                volume: row.volume,
                title: row.title,
                version: row.version,
                group: row.group,
                language: row.language,
                uploaded_at: row.uploaded_at,
            };
            let series = catalog
                .series
                .get_mut(&SeriesId(row.series))
                .ok_or_raise(|| ErrorKind::InvalidData("chapter.series"))?;
            if series.chapters.insert(chapter.address.clone(), id).is_some() {
                exn::bail!(ErrorKind::InvalidData("chapter.address"));
            }
            let entry = ChapterEntry {
                id,
                series: SeriesId(row.series),
                chapter,
                added_at: from_millis(row.added_at, "chapter.added_at")?,
                read_at: from_millis_map(row.read_at, "chapter.read_at")?,
            };
            if catalog.chapters.insert(id, entry).is_some() || catalog.series.contains_key(&SeriesId(row.id)) {
                exn::bail!(ErrorKind::InvalidData("chapter.id"));
            }
        }
        Ok(catalog)
    }
}

/// Serialize a catalog to its stored form.
pub(crate) fn encode(catalog: &Catalog) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(&CatalogDocument::from(catalog)).or_raise(|| ErrorKind::Serialization)
}

/// Parse a stored catalog.
pub(crate) fn decode(bytes: &[u8]) -> Result<Catalog> {
    let document: CatalogDocument = serde_json::from_slice(bytes).or_raise(|| ErrorKind::Serialization)?;
    Catalog::try_from(document)
}
