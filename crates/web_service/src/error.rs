use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use playground_llm::ConnectorError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("No API key configured for provider '{0}'")]
    KeyNotConfigured(String),

    #[error("Failed to connect to Ollama. Is the service running?")]
    OllamaUnreachable,

    #[error("{0}")]
    Connector(#[from] ConnectorError),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct JsonError {
    message: String,
    r#type: String,
}

#[derive(Serialize)]
struct JsonErrorWrapper {
    error: JsonError,
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::KeyNotConfigured(_) => "invalid_request",
            AppError::OllamaUnreachable => "service_unavailable",
            AppError::Connector(_) => "api_error",
            AppError::InternalError(_) => "api_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::KeyNotConfigured(_) => StatusCode::BAD_REQUEST,
            AppError::OllamaUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Connector(ConnectorError::Config(_)) => StatusCode::BAD_REQUEST,
            AppError::Connector(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_response = JsonErrorWrapper {
            error: JsonError {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
            },
        };
        HttpResponse::build(self.status_code()).json(error_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_api_errors_surface_the_provider_message_verbatim() {
        let err = AppError::Connector(ConnectorError::Api("rate limited".to_string()));
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_key_is_a_client_error() {
        let err = AppError::Connector(ConnectorError::Config(
            "OpenAI API key is not configured".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ollama_unreachable_message_and_status() {
        let err = AppError::OllamaUnreachable;
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            err.to_string(),
            "Failed to connect to Ollama. Is the service running?"
        );
    }
}
