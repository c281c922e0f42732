//! Application state wiring the services together.
//!
//! `AppState` holds what every command needs (data directory and config).
//! Credentials, gateways and the chat service are built on demand so that
//! session management works without API keys.

use std::path::PathBuf;

use anyhow::Context;

use crosscheck_core::chat::ChatService;
use crosscheck_core::event::EventBus;
use crosscheck_core::llm::box_gateway::BoxModelGateway;
use crosscheck_core::llm::retry::RetryPolicy;
use crosscheck_core::pipeline::Orchestrator;
use crosscheck_core::session::SessionBook;
use crosscheck_infra::config::load_global_config;
use crosscheck_infra::filesystem::{ensure_data_dir, resolve_data_dir, sessions_path};
use crosscheck_infra::llm::build_gateways;
use crosscheck_infra::secret::ApiCredentials;
use crosscheck_infra::store::JsonFileSessionStore;
use crosscheck_types::config::GlobalConfig;

/// Chat service pinned to the JSON file store.
pub type ConcreteChatService = ChatService<JsonFileSessionStore>;

pub type ConcreteSessionBook = SessionBook<JsonFileSessionStore>;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
}

impl AppState {
    /// Resolve the data directory, create it, and load `config.toml`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let config = load_global_config(&data_dir).await;
        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");
        Ok(Self::with_parts(data_dir, config))
    }

    pub fn with_parts(data_dir: PathBuf, config: GlobalConfig) -> Self {
        Self { data_dir, config }
    }

    pub fn sessions_path(&self) -> PathBuf {
        sessions_path(&self.data_dir, &self.config.persistence.file_name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(crosscheck_infra::config::CONFIG_FILE_NAME)
    }

    pub fn session_store(&self) -> JsonFileSessionStore {
        JsonFileSessionStore::new(self.sessions_path(), self.config.persistence.on_corrupt)
    }

    pub async fn open_book(&self) -> anyhow::Result<ConcreteSessionBook> {
        SessionBook::open(self.session_store())
            .await
            .with_context(|| format!("failed to open sessions at {}", self.sessions_path().display()))
    }

    pub fn credentials(&self) -> anyhow::Result<ApiCredentials> {
        ApiCredentials::resolve(&self.data_dir)
    }

    pub fn gateways(
        &self,
        credentials: &ApiCredentials,
    ) -> anyhow::Result<(BoxModelGateway, BoxModelGateway)> {
        build_gateways(&self.config.backends, credentials).context("failed to build model gateways")
    }

    /// Wire gateways, orchestrator and session book into a chat service.
    pub async fn chat_service(
        &self,
        credentials: &ApiCredentials,
        events: EventBus,
    ) -> anyhow::Result<ConcreteChatService> {
        let (gateway_a, gateway_b) = self.gateways(credentials)?;
        let orchestrator = Orchestrator::new(
            gateway_a,
            gateway_b,
            RetryPolicy::from_config(&self.config.retry),
        )
        .with_concurrency(self.config.pipeline.concurrent_calls)
        .with_events(events);
        let book = self.open_book().await?;
        Ok(ChatService::new(orchestrator, book))
    }
}
