//! playground-llm - Multi-provider chat connector layer
//!
//! Normalizes the wire protocols of several LLM providers (OpenAI,
//! Anthropic, Google, Ollama) behind one [`Connector`] contract: key
//! validation, model discovery, and chat completion with incremental text
//! streaming. Each provider's streaming format is handled by a dedicated
//! push parser that can be exercised without any network.

pub mod connector;
pub mod providers;
pub mod registry;

pub use connector::{ChatReply, Connector, ConnectorError, Result, TextStream};
pub use providers::anthropic::AnthropicConnector;
pub use providers::google::GoogleConnector;
pub use providers::ollama::OllamaConnector;
pub use providers::openai::OpenAiConnector;
pub use registry::ConnectorRegistry;
