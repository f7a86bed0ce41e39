mod chain;
pub mod error;
mod footer;
mod format;

pub use crate::chain::{Outcome, ProcessedPage, Processor, ProcessorChain};
pub use crate::footer::{FooterCrop, count_footer_lines, crop_footer};
pub use crate::format::{detect_format, extension};
