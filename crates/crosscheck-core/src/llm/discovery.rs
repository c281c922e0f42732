//! Backend A model discovery.
//!
//! Selection is a pure function over an injected model listing, so it can be
//! tested without network access. `ModelSelector` adds the once-per-process
//! caching and the rediscover-after-not-found behaviour on top.

use tokio::sync::RwLock;

use super::gateway::ModelCatalog;

/// Where a selected model identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    /// Matched an entry of the preference list.
    Preferred,
    /// No preference matched; the first listed model was taken.
    FirstAvailable,
    /// Listing was empty or unavailable.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub model_id: String,
    pub source: DiscoverySource,
}

/// Strip the `models/` resource prefix some providers put on model names.
pub fn normalize_model_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("models/").unwrap_or(name)
}

/// Pick a model from `available` according to `preferences`.
///
/// Preference order wins over listing order. If nothing matches but the
/// provider listed models, the first listed one is used; an empty listing
/// yields `default_id`.
pub fn discover(preferences: &[String], available: &[String], default_id: &str) -> Discovery {
    let available: Vec<&str> = available
        .iter()
        .map(|m| normalize_model_name(m))
        .filter(|m| !m.is_empty())
        .collect();

    for preferred in preferences {
        let preferred = normalize_model_name(preferred);
        if available.contains(&preferred) {
            return Discovery {
                model_id: preferred.to_string(),
                source: DiscoverySource::Preferred,
            };
        }
    }

    match available.first() {
        Some(first) => Discovery {
            model_id: (*first).to_string(),
            source: DiscoverySource::FirstAvailable,
        },
        None => Discovery {
            model_id: normalize_model_name(default_id).to_string(),
            source: DiscoverySource::Default,
        },
    }
}

/// Caches the discovered backend A model for the life of the process.
#[derive(Debug)]
pub struct ModelSelector {
    preferences: Vec<String>,
    default_id: String,
    selected: RwLock<Option<String>>,
}

impl ModelSelector {
    pub fn new(preferences: Vec<String>, default_id: impl Into<String>) -> Self {
        Self {
            preferences,
            default_id: default_id.into(),
            selected: RwLock::new(None),
        }
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Run discovery against `catalog` without touching the cache.
    ///
    /// A catalog failure is logged and resolves to the default identifier.
    pub async fn probe<C: ModelCatalog>(&self, catalog: &C) -> Discovery {
        match catalog.list_models().await {
            Ok(models) => {
                let discovery = discover(&self.preferences, &models, &self.default_id);
                tracing::debug!(
                    model = %discovery.model_id,
                    source = ?discovery.source,
                    listed = models.len(),
                    "model discovery finished"
                );
                discovery
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default = %self.default_id,
                    "model discovery failed, using default model"
                );
                Discovery {
                    model_id: normalize_model_name(&self.default_id).to_string(),
                    source: DiscoverySource::Default,
                }
            }
        }
    }

    /// The selected model, discovering it on first use.
    pub async fn current<C: ModelCatalog>(&self, catalog: &C) -> String {
        if let Some(model) = self.selected.read().await.as_ref() {
            return model.clone();
        }

        let mut selected = self.selected.write().await;
        // Another caller may have finished discovery while we waited.
        if let Some(model) = selected.as_ref() {
            return model.clone();
        }
        let discovery = self.probe(catalog).await;
        *selected = Some(discovery.model_id.clone());
        discovery.model_id
    }

    /// Forget the cached selection so the next `current()` rediscovers.
    pub async fn invalidate(&self) {
        let previous = self.selected.write().await.take();
        if let Some(model) = previous {
            tracing::info!(model = %model, "model selection invalidated");
        }
    }
}
