//! `ComicInfo.xml` generation.
//!
//! Written line by line; the schema is flat enough that a serializer buys
//! nothing.

use shelf_metadata::models::{Chapter, Series};
use time::UtcDateTime;

/// Name of the metadata entry inside every archive.
pub const COMIC_INFO: &str = "ComicInfo.xml";

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn element(lines: &mut Vec<String>, name: &str, value: impl AsRef<str>) {
    let value = value.as_ref();
    if !value.is_empty() {
        lines.push(format!("  <{name}>{}</{name}>", xml_escape(value)));
    }
}

/// Build the metadata document for a chapter with `page_count` pages (the
/// preview image not included).
pub fn comic_info(series: &Series, chapter: &Chapter, page_count: u32) -> String {
    let mut lines = vec![
        r#"<?xml version="1.0"?>"#.to_string(),
        r#"<ComicInfo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">"#
            .to_string(),
    ];
    element(&mut lines, "Title", &chapter.title);
    element(&mut lines, "Series", &series.title);
    if let Some(number) = chapter.number {
        element(&mut lines, "Number", number.to_string());
    }
    if let Some(volume) = chapter.volume {
        element(&mut lines, "Volume", volume.to_string());
    }
    if let Some(summary) = &series.summary {
        element(&mut lines, "Summary", summary);
    }
    if let Some(uploaded) = chapter.uploaded_at.and_then(|ms| UtcDateTime::from_unix_timestamp(ms.div_euclid(1000)).ok())
    {
        element(&mut lines, "Year", uploaded.year().to_string());
        element(&mut lines, "Month", u8::from(uploaded.month()).to_string());
        element(&mut lines, "Day", uploaded.day().to_string());
    }
    element(&mut lines, "Writer", series.authors.join(", "));
    element(&mut lines, "Penciller", series.artists.join(", "));
    element(&mut lines, "Genre", series.genres.iter().map(String::as_str).collect::<Vec<_>>().join(", "));
    element(&mut lines, "Format", series.kind.as_str());
    if let Some(group) = &chapter.group {
        element(&mut lines, "ScanInformation", group);
    }
    if let Some(language) = &chapter.language {
        element(&mut lines, "LanguageISO", language);
    }
    element(&mut lines, "PageCount", (page_count + 1).to_string());
    lines.push("  <Pages>".to_string());
    lines.push(r#"    <Page Image="0" Type="FrontCover" />"#.to_string());
    for image in 1..=page_count {
        lines.push(format!(r#"    <Page Image="{image}" />"#));
    }
    lines.push("  </Pages>".to_string());
    lines.push("</ComicInfo>".to_string());
    lines.join("\n")
}
