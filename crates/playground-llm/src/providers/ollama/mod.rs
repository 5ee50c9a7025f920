//! Ollama connector: a keyless local inference service.
//!
//! No credential is involved; validation degrades to a reachability probe
//! of the local service.

mod ndjson;

pub use ndjson::NdjsonLineParser;

use async_trait::async_trait;
use chat_core::{ChatMessage, ModelConfig, ModelInfo, ProviderId, MAX_DYNAMIC_MODELS};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::connector::{ChatReply, Connector, ConnectorError, Result};
use crate::providers::common::{text_stream_from_response, PushParser};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaConnector {
    client: Client,
    base_url: String,
}

impl OllamaConnector {
    /// Base URL from `OLLAMA_BASE_URL`, falling back to the local default.
    pub fn new() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OllamaConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

#[derive(Debug, Deserialize)]
struct TaggedModel {
    name: String,
    #[serde(default)]
    details: Option<ModelDetails>,
}

#[derive(Debug, Deserialize)]
struct ModelDetails {
    #[serde(default)]
    family: String,
    #[serde(default)]
    parameter_size: String,
    #[serde(default)]
    quantization_level: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    temperature: f64,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

fn build_chat_request<'a>(
    messages: &'a [ChatMessage],
    config: &'a ModelConfig,
    stream: bool,
) -> OllamaChatRequest<'a> {
    OllamaChatRequest {
        model: &config.model,
        messages: messages
            .iter()
            .map(|m| OllamaChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        stream,
        options: OllamaOptions {
            temperature: config.temperature,
            num_predict: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            stop: config.stop_sequences.as_deref(),
        },
    }
}

/// Format a local model name for display, e.g. "llama3.2:latest" ->
/// "Llama 3.2".
fn format_model_name(name: &str) -> String {
    let base = name.split(':').next().unwrap_or(name);
    let mut out = String::with_capacity(base.len() + 4);
    let mut prev_alpha = false;
    for (i, c) in base.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
            prev_alpha = c.is_alphabetic();
            continue;
        }
        if prev_alpha && c.is_ascii_digit() {
            out.push(' ');
        }
        out.push(c);
        prev_alpha = c.is_alphabetic();
    }
    out
}

/// Estimated context window for known model families.
fn context_window_for(model_name: &str) -> u32 {
    let name = model_name.to_lowercase();
    if name.contains("llama3") {
        8192
    } else if name.contains("llama2") {
        4096
    } else if name.contains("mistral") || name.contains("mixtral") {
        32_768
    } else if name.contains("codellama") {
        16_384
    } else if name.contains("phi") {
        2048
    } else if name.contains("gemma") {
        8192
    } else if name.contains("qwen") || name.contains("deepseek") {
        32_768
    } else {
        4096
    }
}

fn describe_model(model: &TaggedModel) -> String {
    let Some(details) = &model.details else {
        return format!("Local model: {}", model.name);
    };

    let parts: Vec<&str> = [
        details.parameter_size.as_str(),
        details.quantization_level.as_str(),
        details.family.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect();

    if parts.is_empty() {
        format!("Local model: {}", model.name)
    } else {
        parts.join(" • ")
    }
}

#[async_trait]
impl Connector for OllamaConnector {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    async fn validate_key(&self, _api_key: &str) -> bool {
        // No key: probe whether the service is reachable at all.
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("Ollama reachability probe failed: {err}");
                false
            }
        }
    }

    async fn list_models(&self, _api_key: &str) -> Vec<ModelInfo> {
        let response = match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::debug!("Ollama tags returned {}", response.status());
                return Vec::new();
            }
            Err(err) => {
                log::debug!("Ollama tags request failed: {err}");
                return Vec::new();
            }
        };

        let models = match response.json::<TagsResponse>().await {
            Ok(body) => body.models,
            Err(err) => {
                log::debug!("Ollama tags parse error: {err}");
                return Vec::new();
            }
        };

        models
            .into_iter()
            .take(MAX_DYNAMIC_MODELS)
            .map(|model| ModelInfo {
                name: format_model_name(&model.name),
                context_window: context_window_for(&model.name),
                description: describe_model(&model),
                id: model.name,
                provider: ProviderId::Ollama,
                available: true,
            })
            .collect()
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &ModelConfig,
        _api_key: &str,
        stream: bool,
    ) -> Result<ChatReply> {
        let body = build_chat_request(messages, config, stream);
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Api(format!("Ollama API error: {text}")));
        }

        if stream {
            Ok(ChatReply::Stream(text_stream_from_response(
                response,
                NdjsonLineParser::new(),
            )))
        } else {
            // With stream=false Ollama answers with a single JSON object;
            // the line parser handles both that and a line-delimited body.
            let body = response.text().await?;
            let mut parser = NdjsonLineParser::new();
            let mut content: String = parser.push(body.as_bytes()).concat();
            content.push_str(&parser.finish().concat());
            Ok(ChatReply::Complete(content))
        }
    }
}
