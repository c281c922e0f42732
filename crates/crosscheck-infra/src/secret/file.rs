//! `secrets.toml` secret source.
//!
//! A flat table of `KEY = "value"` pairs in the data directory, using the
//! same key names as the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::SecretSource;

pub const SECRETS_FILE_NAME: &str = "secrets.toml";

pub struct FileSecretSource {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileSecretSource {
    /// Read `{data_dir}/secrets.toml`. A missing or unparsable file yields an
    /// empty source; the latter is logged.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SECRETS_FILE_NAME);
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<HashMap<String, String>>(&content) {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!("Failed to parse {}: {err}, ignoring it", path.display());
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                tracing::warn!("Failed to read {}: {err}, ignoring it", path.display());
                HashMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretSource for FileSecretSource {
    fn name(&self) -> &str {
        SECRETS_FILE_NAME
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
