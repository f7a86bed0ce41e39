mod comicinfo;
pub mod error;
mod packager;
mod staged;

pub use crate::comicinfo::{COMIC_INFO, comic_info};
pub use crate::packager::{DEFAULT_PAGE_CONCURRENCY, Packager};
pub use crate::staged::{Slot, StagedArchive};
