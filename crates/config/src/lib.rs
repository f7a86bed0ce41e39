//! Layered configuration for shelf.
//!
//! Defaults, then an optional TOML/YAML/JSON file, then `SHELF_*` environment
//! variables (`__` separates nested keys, e.g. `SHELF_FILTER__GROUP`).

pub mod error;
mod load;
mod models;

pub use crate::load::ENV_PREFIX;
pub use crate::models::{Config, FilterSettings, NamingSettings, ProcessorSettings};
pub use crate::models::{DEFAULT_CATALOG_PATH, DEFAULT_PAGE_CONCURRENCY, DEFAULT_SERIES_CONCURRENCY, DEFAULT_USER};
