//! Synchronization of provider series into an archive library.
//!
//! The primary entry points are [`Synchronizer::sync_series`] for a single
//! series and [`Synchronizer::sync_all`], which streams [`SyncEvent`]s for a
//! batch of series.

pub mod error;
mod filter;
mod report;
mod stream;
mod synchronizer;

pub use crate::filter::ChapterFilter;
pub use crate::report::{ChapterFailure, SyncReport, pretty_elapsed};
pub use crate::stream::SyncEvent;
pub use crate::synchronizer::{ORPHAN_SUFFIX, Synchronizer};
