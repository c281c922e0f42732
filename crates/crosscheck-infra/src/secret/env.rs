//! Environment variable secret source.
//!
//! Highest priority in the chain: env vars override `secrets.toml`.

use super::SecretSource;

pub struct EnvSecretSource;

impl EnvSecretSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvSecretSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretSource for EnvSecretSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        match std::env::var(key) {
            Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
            // Unset, blank, or not valid Unicode: treat as not found.
            _ => None,
        }
    }
}
