//! Resolution of provider identifiers to connector instances.

use std::sync::Arc;

use chat_core::ProviderId;

use crate::connector::Connector;
use crate::providers::anthropic::AnthropicConnector;
use crate::providers::google::GoogleConnector;
use crate::providers::ollama::OllamaConnector;
use crate::providers::openai::OpenAiConnector;

/// One connector per provider, built once at startup.
///
/// Lookup is a closed match over [`ProviderId`] and cannot fail: unknown
/// identifiers are rejected earlier, where strings are parsed into the
/// enum.
pub struct ConnectorRegistry {
    openai: Arc<dyn Connector>,
    anthropic: Arc<dyn Connector>,
    google: Arc<dyn Connector>,
    ollama: Arc<dyn Connector>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            openai: Arc::new(OpenAiConnector::new()),
            anthropic: Arc::new(AnthropicConnector::new()),
            google: Arc::new(GoogleConnector::new()),
            ollama: Arc::new(OllamaConnector::new()),
        }
    }

    /// Replace one provider's connector, keyed by the connector's own id.
    /// Used to point a provider at a different endpoint, e.g. a mock
    /// server in tests.
    pub fn with(mut self, connector: Arc<dyn Connector>) -> Self {
        match connector.id() {
            ProviderId::OpenAi => self.openai = connector,
            ProviderId::Anthropic => self.anthropic = connector,
            ProviderId::Google => self.google = connector,
            ProviderId::Ollama => self.ollama = connector,
        }
        self
    }

    pub fn get(&self, id: ProviderId) -> Arc<dyn Connector> {
        match id {
            ProviderId::OpenAi => Arc::clone(&self.openai),
            ProviderId::Anthropic => Arc::clone(&self.anthropic),
            ProviderId::Google => Arc::clone(&self.google),
            ProviderId::Ollama => Arc::clone(&self.ollama),
        }
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
