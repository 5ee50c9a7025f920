//! OpenAI connector: chat completions over bearer-auth SSE.

mod sse;

pub use sse::SseLineParser;

use async_trait::async_trait;
use chat_core::{ChatMessage, ModelConfig, ModelInfo, ProviderId, MAX_DYNAMIC_MODELS};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::connector::{ChatReply, Connector, ConnectorError, Result};
use crate::providers::common::{error_from_response, text_stream_from_response};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const GENERIC_ERROR: &str = "OpenAI API request failed";

pub struct OpenAiConnector {
    client: Client,
    base_url: String,
}

impl OpenAiConnector {
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
}

impl Default for OpenAiConnector {
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
    created: i64,
}

/// Build the chat completions request body.
///
/// Unset optional sampling fields are omitted rather than sent as null.
pub fn build_chat_body(messages: &[ChatMessage], config: &ModelConfig, stream: bool) -> Value {
    let mut body = json!({
        "model": config.model,
        "messages": messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect::<Vec<_>>(),
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
        "stream": stream,
    });

    if let Some(top_p) = config.top_p {
        body["top_p"] = json!(top_p);
    }
    if let Some(frequency_penalty) = config.frequency_penalty {
        body["frequency_penalty"] = json!(frequency_penalty);
    }
    if let Some(presence_penalty) = config.presence_penalty {
        body["presence_penalty"] = json!(presence_penalty);
    }

    body
}

#[async_trait]
impl Connector for OpenAiConnector {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("OpenAI validation error: {err}");
                false
            }
        }
    }

    async fn list_models(&self, api_key: &str) -> Vec<ModelInfo> {
        let response = match self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(_) => return Vec::new(),
            Err(err) => {
                log::debug!("OpenAI list models error: {err}");
                return Vec::new();
            }
        };

        let mut models = match response.json::<ListModelsResponse>().await {
            Ok(body) => body.data,
            Err(err) => {
                log::debug!("OpenAI list models parse error: {err}");
                return Vec::new();
            }
        };

        // Most recently created first.
        models.sort_by(|a, b| b.created.cmp(&a.created));
        models.truncate(MAX_DYNAMIC_MODELS);

        models
            .into_iter()
            .map(|model| ModelInfo {
                name: model.id.clone(),
                id: model.id,
                provider: ProviderId::OpenAi,
                // Reasonable assumption for current-generation models; the
                // list endpoint does not report context sizes.
                context_window: 128_000,
                description: "Dynamic model from OpenAI".to_string(),
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
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let body = build_chat_body(messages, config, stream);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, GENERIC_ERROR).await);
        }

        if stream {
            Ok(ChatReply::Stream(text_stream_from_response(
                response,
                SseLineParser::new(),
            )))
        } else {
            let body: Value = response.json().await?;
            let content = body["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            Ok(ChatReply::Complete(content))
        }
    }
}
