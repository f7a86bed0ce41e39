use exn::OptionExt;

use crate::ProviderHandle;
use crate::error::{ErrorKind, Result};

/// The set of providers available to a run.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<ProviderHandle>,
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: ProviderHandle) -> Self {
        self.providers.push(provider);
        self
    }

    /// The first registered provider that handles `address`.
    pub fn open(&self, address: &str) -> Result<ProviderHandle> {
        self.providers
            .iter()
            .find(|p| p.handles(address))
            .cloned()
            .ok_or_raise(|| ErrorKind::Unsupported(address.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}
