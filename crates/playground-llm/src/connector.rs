//! The provider-agnostic connector contract.

use std::pin::Pin;

use async_trait::async_trait;
use chat_core::{ChatMessage, ModelConfig, ModelInfo, ProviderId};
use futures::{Stream, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-reported application error. Displays the provider's own
    /// message verbatim so callers can surface it unchanged.
    #[error("{0}")]
    Api(String),

    /// Configuration problem detected before any network call.
    #[error("{0}")]
    Config(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Lazy sequence of incremental text fragments from a streaming reply.
///
/// There is no cancellation token: dropping the stream closes the
/// underlying connection.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Outcome of a chat call: a fully buffered reply, or a stream of
/// incremental fragments.
pub enum ChatReply {
    Complete(String),
    Stream(TextStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            ChatReply::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

impl ChatReply {
    /// Drain the reply into a single string, concatenating stream
    /// fragments when necessary.
    pub async fn into_text(self) -> Result<String> {
        match self {
            ChatReply::Complete(text) => Ok(text),
            ChatReply::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(fragment) = stream.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}

/// Adapter translating normalized chat requests into one provider's wire
/// protocol and back.
///
/// Connectors are stateless beyond their construction-time endpoint and
/// never retain request or response data after returning.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The provider this connector implements.
    fn id(&self) -> ProviderId;

    /// Probe the supplied credential with a lightweight provider call.
    ///
    /// Returns true only on an HTTP success response. Never errors:
    /// network and protocol failures degrade to false. Keyless providers
    /// probe service reachability instead.
    async fn validate_key(&self, api_key: &str) -> bool;

    /// List the provider's available models.
    ///
    /// Any failure yields an empty list, which callers must treat as
    /// "unknown", not as a hard error. At most
    /// [`chat_core::MAX_DYNAMIC_MODELS`] entries are returned, preferring
    /// the most recent by the provider's own creation order.
    async fn list_models(&self, api_key: &str) -> Vec<ModelInfo>;

    /// Issue a chat completion.
    ///
    /// A non-success HTTP status fails with the provider's own error
    /// message when the body carries one.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &ModelConfig,
        api_key: &str,
        stream: bool,
    ) -> Result<ChatReply>;
}
