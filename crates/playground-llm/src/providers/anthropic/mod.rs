//! Anthropic connector: the messages API with its dedicated system field.
//!
//! Streaming is deliberately pass-through: the reply stream carries the
//! response body's chunks decoded as text, and the caller handles
//! Anthropic's own event framing. The other connectors normalize their
//! streams fully; this asymmetry is intentional.

use async_trait::async_trait;
use chat_core::{ChatMessage, ModelConfig, ModelInfo, ProviderId, Role, MAX_DYNAMIC_MODELS};
use chrono::DateTime;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::connector::{ChatReply, Connector, ConnectorError, Result};
use crate::providers::common::{error_from_response, text_stream_from_response, Utf8Passthrough};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const GENERIC_ERROR: &str = "Anthropic API request failed";

pub struct AnthropicConnector {
    client: Client,
    base_url: String,
}

impl AnthropicConnector {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn with_headers(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            // Required for calls issued straight from the browser.
            .header("anthropic-dangerous-direct-browser-access", "true")
    }
}

impl Default for AnthropicConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    data: Vec<ListedModel>,
}

#[derive(Debug, Deserialize)]
struct ListedModel {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

fn created_at_timestamp(model: &ListedModel) -> Option<i64> {
    let raw = model.created_at.as_deref()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.timestamp())
}

/// Build the messages API request body.
///
/// A `system` turn is pulled out of the message list entirely and sent
/// through the dedicated `system` field.
pub fn build_chat_body(messages: &[ChatMessage], config: &ModelConfig, stream: bool) -> Value {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.clone());

    let mut body = json!({
        "model": config.model,
        "messages": messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect::<Vec<_>>(),
        "max_tokens": config.max_tokens,
        "temperature": config.temperature,
        "stream": stream,
    });

    if let Some(system) = system {
        body["system"] = json!(system);
    }
    if let Some(top_p) = config.top_p {
        body["top_p"] = json!(top_p);
    }

    body
}

#[async_trait]
impl Connector for AnthropicConnector {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let request = self.client.get(format!("{}/models", self.base_url));
        match self.with_headers(request, api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("Anthropic validation error: {err}");
                false
            }
        }
    }

    async fn list_models(&self, api_key: &str) -> Vec<ModelInfo> {
        let request = self.client.get(format!("{}/models", self.base_url));
        let response = match self.with_headers(request, api_key).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(_) => return Vec::new(),
            Err(err) => {
                log::debug!("Anthropic list models error: {err}");
                return Vec::new();
            }
        };

        let mut models = match response.json::<ListModelsResponse>().await {
            Ok(body) => body.data,
            Err(err) => {
                log::debug!("Anthropic list models parse error: {err}");
                return Vec::new();
            }
        };

        // Most recently created first; entries without a timestamp keep
        // their reported order.
        models.sort_by(|a, b| match (created_at_timestamp(a), created_at_timestamp(b)) {
            (Some(a), Some(b)) => b.cmp(&a),
            _ => std::cmp::Ordering::Equal,
        });
        models.truncate(MAX_DYNAMIC_MODELS);

        models
            .into_iter()
            .map(|model| ModelInfo {
                name: model.display_name.unwrap_or_else(|| model.id.clone()),
                id: model.id,
                provider: ProviderId::Anthropic,
                context_window: 200_000,
                description: "Dynamic model from Anthropic".to_string(),
                available: true,
            })
            .collect()
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &ModelConfig,
        api_key: &str,
        stream: bool,
    ) -> Result<ChatReply> {
        if api_key.trim().is_empty() {
            return Err(ConnectorError::Config(
                "Anthropic API key is not configured".to_string(),
            ));
        }

        let body = build_chat_body(messages, config, stream);
        let request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&body);
        let response = self.with_headers(request, api_key).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, GENERIC_ERROR).await);
        }

        if stream {
            Ok(ChatReply::Stream(text_stream_from_response(
                response,
                Utf8Passthrough::default(),
            )))
        } else {
            let body: Value = response.json().await?;
            let content = body["content"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            Ok(ChatReply::Complete(content))
        }
    }
}
