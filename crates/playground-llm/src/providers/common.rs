//! Helpers shared by the provider connectors.

use futures_util::StreamExt;
use reqwest::Response;
use serde_json::Value;

use crate::connector::{ConnectorError, TextStream};

/// Incremental parser over a streaming response body: fed byte chunks,
/// emits normalized text fragments.
pub trait PushParser: Send {
    /// Consume one network read's worth of bytes.
    fn push(&mut self, chunk: &[u8]) -> Vec<String>;

    /// Flush anything still buffered once the body ends.
    fn finish(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the protocol signalled its own end of stream.
    fn is_done(&self) -> bool {
        false
    }
}

/// Drive a [`PushParser`] over a streaming HTTP body.
pub(crate) fn text_stream_from_response<P>(response: Response, parser: P) -> TextStream
where
    P: PushParser + 'static,
{
    let stream = async_stream::try_stream! {
        let mut parser = parser;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(ConnectorError::from)?;
            for fragment in parser.push(&chunk) {
                yield fragment;
            }
            if parser.is_done() {
                break;
            }
        }
        for fragment in parser.finish() {
            yield fragment;
        }
    };
    Box::pin(stream)
}

/// Extract a provider-reported error message from a response body, falling
/// back to a per-provider generic string.
///
/// Providers agree on the `{"error":{"message":...}}` shape for structured
/// errors.
pub fn api_error_message(body: &str, fallback: &str) -> String {
    fn extract(value: &Value) -> Option<String> {
        let message = value.get("error")?.get("message")?.as_str()?;
        if message.is_empty() {
            return None;
        }
        Some(message.to_string())
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(extract)
        .unwrap_or_else(|| fallback.to_string())
}

/// Read a failed response's body and extract its error message.
pub(crate) async fn error_from_response(response: Response, fallback: &str) -> ConnectorError {
    let body = response.text().await.unwrap_or_default();
    ConnectorError::Api(api_error_message(&body, fallback))
}

/// Pass-through decoder: emits body chunks as text without interpreting
/// any framing, carrying incomplete UTF-8 sequences over to the next read.
#[derive(Default)]
pub(crate) struct Utf8Passthrough {
    carry: Vec<u8>,
}

impl PushParser for Utf8Passthrough {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(chunk);

        match std::str::from_utf8(&data) {
            Ok(text) if text.is_empty() => Vec::new(),
            Ok(text) => vec![text.to_string()],
            Err(err) => {
                let valid = err.valid_up_to();
                if err.error_len().is_none() {
                    // Incomplete trailing sequence: hold it for the next read.
                    let rest = data.split_off(valid);
                    self.carry = rest;
                    let text = String::from_utf8_lossy(&data).into_owned();
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![text]
                    }
                } else {
                    vec![String::from_utf8_lossy(&data).into_owned()]
                }
            }
        }
    }

    fn finish(&mut self) -> Vec<String> {
        if self.carry.is_empty() {
            return Vec::new();
        }
        vec![String::from_utf8_lossy(&std::mem::take(&mut self.carry)).into_owned()]
    }
}
