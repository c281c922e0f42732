//! Secret chain -- sources in priority order, first match wins.
//!
//! Default chain order: `[EnvSecretSource, FileSecretSource]`.

use std::path::Path;

use super::SecretSource;
use super::env::EnvSecretSource;
use super::file::FileSecretSource;

pub struct SecretChain {
    sources: Vec<Box<dyn SecretSource>>,
}

impl SecretChain {
    pub fn new(sources: Vec<Box<dyn SecretSource>>) -> Self {
        Self { sources }
    }

    /// Look `key` up in each source in order.
    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            let value = source.get(key)?;
            tracing::debug!(key, source = source.name(), "secret resolved");
            Some(value)
        })
    }

    /// First key of `keys` that resolves anywhere in the chain.
    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }
}

/// Build the default chain: environment first, then `{data_dir}/secrets.toml`.
pub fn build_secret_chain(data_dir: &Path) -> SecretChain {
    SecretChain::new(vec![
        Box::new(EnvSecretSource::new()),
        Box::new(FileSecretSource::load(data_dir)),
    ])
}
