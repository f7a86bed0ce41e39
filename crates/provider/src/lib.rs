pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod provider;
mod registry;

#[cfg(feature = "mock")]
pub use crate::mock::MockProvider;
pub use crate::provider::{Page, Provider};
pub use crate::registry::Registry;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn Provider>;
