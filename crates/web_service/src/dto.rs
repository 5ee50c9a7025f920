//! Request and response bodies for the HTTP API.

use chat_core::{ChatMessage, ModelConfig, ProviderId, Role};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_stream() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub provider: ProviderId,
    pub model: String,
    pub messages: Vec<IncomingMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl ChatRequest {
    /// Bounds-check the sampling parameters and produce the connector
    /// config. Rejection happens here, before any provider call.
    pub fn into_parts(self) -> Result<(ProviderId, Vec<ChatMessage>, ModelConfig, bool), AppError> {
        if self.model.trim().is_empty() {
            return Err(AppError::InvalidRequest("model must not be empty".to_string()));
        }
        if self.messages.is_empty() {
            return Err(AppError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AppError::InvalidRequest(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if !(256..=16_384).contains(&self.max_tokens) {
            return Err(AppError::InvalidRequest(format!(
                "max_tokens must be between 256 and 16384, got {}",
                self.max_tokens
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(AppError::InvalidRequest(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }

        let config = ModelConfig::new(self.provider, self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_top_p(self.top_p);

        let messages = self
            .messages
            .into_iter()
            .map(|m| ChatMessage::new(m.role, m.content))
            .collect();

        Ok((self.provider, messages, config, self.stream))
    }
}

/// Body of `POST /api/keys`.
#[derive(Debug, Deserialize)]
pub struct SetKeyRequest {
    pub provider: ProviderId,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> ChatRequest {
        serde_json::from_value(body).unwrap()
    }

    fn minimal(extra: serde_json::Value) -> serde_json::Value {
        let mut body = json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }]
        });
        if let (Some(base), Some(patch)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in patch {
                base.insert(k.clone(), v.clone());
            }
        }
        body
    }

    #[test]
    fn defaults_fill_missing_sampling_fields() {
        let req = request(minimal(json!({})));
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.top_p, 0.9);
        assert_eq!(req.max_tokens, 4096);
        assert!(req.stream);
        assert!(req.into_parts().is_ok());
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let req = request(minimal(json!({ "temperature": 1.5 })));
        let err = req.into_parts().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn max_tokens_bounds_are_inclusive() {
        assert!(request(minimal(json!({ "max_tokens": 256 }))).into_parts().is_ok());
        assert!(request(minimal(json!({ "max_tokens": 16384 }))).into_parts().is_ok());
        assert!(request(minimal(json!({ "max_tokens": 255 }))).into_parts().is_err());
        assert!(request(minimal(json!({ "max_tokens": 16385 }))).into_parts().is_err());
    }

    #[test]
    fn empty_message_list_is_rejected() {
        let req = request(json!({
            "provider": "google",
            "model": "gemini-2.0-flash",
            "messages": []
        }));
        assert!(req.into_parts().is_err());
    }

    #[test]
    fn unknown_provider_fails_at_deserialization() {
        let result: Result<ChatRequest, _> = serde_json::from_value(json!({
            "provider": "mistral",
            "model": "mistral-large",
            "messages": [{ "role": "user", "content": "Hi" }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn into_parts_carries_sampling_into_config() {
        let req = request(minimal(json!({ "temperature": 0.2, "max_tokens": 1024 })));
        let (provider, messages, config, stream) = req.into_parts().unwrap();
        assert_eq!(provider, ProviderId::OpenAi);
        assert_eq!(messages.len(), 1);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.top_p, Some(0.9));
        assert!(stream);
    }
}
