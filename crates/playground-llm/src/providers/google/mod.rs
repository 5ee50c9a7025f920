//! Google (Gemini) connector: generateContent over key-in-query auth.

mod stream;

pub use stream::JsonArrayParser;

use async_trait::async_trait;
use chat_core::{ChatMessage, ModelConfig, ModelInfo, ProviderId, Role, MAX_DYNAMIC_MODELS};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::connector::{ChatReply, Connector, ConnectorError, Result};
use crate::providers::common::{error_from_response, text_stream_from_response};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GENERIC_ERROR: &str = "Google API request failed";

pub struct GoogleConnector {
    client: Client,
    base_url: String,
}

impl GoogleConnector {
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

impl Default for GoogleConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ListedModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_token_limit: Option<u32>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Build the generateContent request body.
///
/// Roles are remapped to Google's vocabulary (`user` stays `user`,
/// everything else becomes `model`); a `system` turn is carried through
/// the dedicated `systemInstruction` field instead of `contents`.
pub fn build_chat_body(messages: &[ChatMessage], config: &ModelConfig) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                _ => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut generation_config = json!({
        "temperature": config.temperature,
        "maxOutputTokens": config.max_tokens,
    });
    if let Some(top_p) = config.top_p {
        generation_config["topP"] = json!(top_p);
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });

    if let Some(system) = messages.iter().find(|m| m.role == Role::System) {
        body["systemInstruction"] = json!({ "parts": [{ "text": system.content }] });
    }

    body
}

#[async_trait]
impl Connector for GoogleConnector {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("key", api_key)])
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("Google validation error: {err}");
                false
            }
        }
    }

    async fn list_models(&self, api_key: &str) -> Vec<ModelInfo> {
        let response = match self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("key", api_key)])
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(_) => return Vec::new(),
            Err(err) => {
                log::debug!("Google list models error: {err}");
                return Vec::new();
            }
        };

        let models = match response.json::<ListModelsResponse>().await {
            Ok(body) => body.models,
            Err(err) => {
                log::debug!("Google list models parse error: {err}");
                return Vec::new();
            }
        };

        // No creation order is reported; keep list order, chat-capable
        // models only.
        models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .take(MAX_DYNAMIC_MODELS)
            .map(|model| {
                let id = model
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(&model.name)
                    .to_string();
                ModelInfo {
                    name: model.display_name.unwrap_or_else(|| id.clone()),
                    id,
                    provider: ProviderId::Google,
                    context_window: model.input_token_limit.unwrap_or(32_768),
                    description: model
                        .description
                        .unwrap_or_else(|| "Dynamic model from Google".to_string()),
                    available: true,
                }
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
                "Google API key is not configured".to_string(),
            ));
        }

        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let body = build_chat_body(messages, config);
        let response = self
            .client
            .post(format!("{}/models/{}:{}", self.base_url, config.model, method))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, GENERIC_ERROR).await);
        }

        if stream {
            Ok(ChatReply::Stream(text_stream_from_response(
                response,
                JsonArrayParser::new(),
            )))
        } else {
            let body: Value = response.json().await?;
            let content = body["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            Ok(ChatReply::Complete(content))
        }
    }
}
