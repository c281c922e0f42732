//! Secret resolution for API keys and the optional access password.
//!
//! - `env`: environment variables (highest priority)
//! - `file`: `{data_dir}/secrets.toml`
//! - `chain`: sources wired in priority order
//!
//! Resolved values are wrapped in [`SecretString`] and never logged.

pub mod chain;
pub mod env;
pub mod file;

use std::path::Path;

use anyhow::bail;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use self::chain::{SecretChain, build_secret_chain};

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Older name for the OpenAI key, still honoured.
pub const GPT_API_KEY: &str = "GPT_API_KEY";
pub const ACCESS_PASSWORD: &str = "XCHECK_ACCESS_PASSWORD";

/// A place secrets can be looked up by key.
pub trait SecretSource: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;
}

/// Credentials needed to run a turn.
///
/// Does NOT derive Debug.
pub struct ApiCredentials {
    pub gemini_api_key: SecretString,
    pub openai_api_key: SecretString,
    /// When set, interactive commands ask for it before doing anything.
    pub access_password: Option<SecretString>,
}

impl ApiCredentials {
    /// Resolve from the environment, then `{data_dir}/secrets.toml`.
    pub fn resolve(data_dir: &Path) -> anyhow::Result<Self> {
        Self::from_chain(&build_secret_chain(data_dir))
    }

    pub fn from_chain(chain: &SecretChain) -> anyhow::Result<Self> {
        let gemini = chain.get(GEMINI_API_KEY);
        let openai = chain.get_any(&[OPENAI_API_KEY, GPT_API_KEY]);

        let (gemini, openai) = match (gemini, openai) {
            (Some(g), Some(o)) => (g, o),
            (g, o) => {
                let mut missing = Vec::new();
                if g.is_none() {
                    missing.push(GEMINI_API_KEY.to_string());
                }
                if o.is_none() {
                    missing.push(format!("{OPENAI_API_KEY} (or {GPT_API_KEY})"));
                }
                bail!(
                    "missing API key(s): {}. Set them in the environment or in {}",
                    missing.join(", "),
                    file::SECRETS_FILE_NAME
                );
            }
        };

        Ok(Self {
            gemini_api_key: SecretString::from(gemini),
            openai_api_key: SecretString::from(openai),
            access_password: chain.get(ACCESS_PASSWORD).map(SecretString::from),
        })
    }

    pub fn requires_password(&self) -> bool {
        self.access_password.is_some()
    }

    /// Check an entered password. Always true when none is configured.
    ///
    /// Compares SHA-256 digests so the comparison time does not depend on
    /// where the strings first differ.
    pub fn verify_access_password(&self, input: &str) -> bool {
        let Some(expected) = &self.access_password else {
            return true;
        };
        let expected = Sha256::digest(expected.expose_secret().as_bytes());
        let actual = Sha256::digest(input.as_bytes());
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
