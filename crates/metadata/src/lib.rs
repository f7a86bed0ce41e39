mod consts;
mod date;
pub mod error;
pub mod models;
pub mod naming;
mod padding;
mod scan;

pub use crate::date::parse_upload_date;
pub use crate::padding::{format_padded, parse_padded};
pub use crate::scan::{ChapterMetadata, scan};
